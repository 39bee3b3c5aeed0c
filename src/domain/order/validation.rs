use futures_util::future::{join, join_all};

use super::collaborators::{AddressChecker, ProductCodeChecker};
use super::errors::{AddressRole, ValidationError, ValidationErrors, ValueError};
use super::states::{
    UnvalidatedAddress, UnvalidatedCustomerInfo, UnvalidatedOrder, UnvalidatedOrderLine,
    ValidatedOrder, ValidatedOrderLine,
};
use super::value_objects::{
    ConfirmedAddress, CustomerInfo, EmailAddress, OrderId, OrderQuantity, ProductCode, String50,
};

// ============================================================================
// Validation Step: UnvalidatedOrder -> ValidatedOrder
// ============================================================================
//
// Every independent rule is checked and every failure is reported. Catalog
// and address lookups run concurrently; errors are always reported in the
// same order: order id, customer info, lines (by index), shipping address,
// billing address.
//
// ============================================================================

type Checked<T> = Result<T, ValidationErrors>;

/// Validate a raw order against the catalog and the address service
pub(crate) async fn validate_order(
    product_exists: &dyn ProductCodeChecker,
    address_exists: &dyn AddressChecker,
    input: UnvalidatedOrder,
) -> Result<ValidatedOrder, ValidationErrors> {
    let UnvalidatedOrder {
        order_id,
        customer_info,
        shipping_address,
        billing_address,
        lines,
    } = input;

    let order_id = to_order_id(&order_id);
    let customer_info = to_customer_info(&customer_info);

    let (lines, addresses) = join(
        check_lines(product_exists, &lines),
        check_addresses(address_exists, &shipping_address, billing_address.as_ref()),
    )
    .await;

    let header = ValidationErrors::zip(order_id, customer_info);
    let body = ValidationErrors::zip(lines, addresses);

    match ValidationErrors::zip(header, body) {
        Ok(((order_id, customer_info), (lines, (shipping, billing)))) => {
            tracing::debug!(order_id = %order_id, lines = lines.len(), "Order validated");
            Ok(ValidatedOrder::new(order_id, customer_info, shipping, billing, lines))
        }
        Err(errors) => {
            tracing::debug!(
                error_count = errors.len(),
                infrastructure = errors.has_infrastructure_failure(),
                "Order failed validation"
            );
            Err(errors)
        }
    }
}

fn fail<T>(error: ValidationError) -> Checked<T> {
    Err(ValidationErrors::new(error))
}

fn to_order_id(raw: &str) -> Checked<OrderId> {
    match OrderId::parse(raw) {
        Ok(order_id) => Ok(order_id),
        Err(ValueError::Empty { .. }) => fail(ValidationError::MissingOrderId),
        Err(reason) => fail(ValidationError::InvalidOrderId(reason)),
    }
}

fn to_customer_info(raw: &UnvalidatedCustomerInfo) -> Checked<CustomerInfo> {
    let invalid = |reason| ValidationErrors::new(ValidationError::InvalidCustomerInfo(reason));

    let first_name = String50::parse("first_name", &raw.first_name).map_err(invalid);
    let last_name = String50::parse("last_name", &raw.last_name).map_err(invalid);
    let email_address = EmailAddress::parse(&raw.email_address).map_err(invalid);

    let ((first_name, last_name), email_address) =
        ValidationErrors::zip(ValidationErrors::zip(first_name, last_name), email_address)?;

    Ok(CustomerInfo {
        first_name,
        last_name,
        email_address,
    })
}

async fn check_lines(
    product_exists: &dyn ProductCodeChecker,
    lines: &[UnvalidatedOrderLine],
) -> Checked<Vec<ValidatedOrderLine>> {
    if lines.is_empty() {
        return fail(ValidationError::EmptyOrder);
    }

    let checks = lines
        .iter()
        .enumerate()
        .map(|(line_index, line)| check_line(product_exists, line_index, line));

    ValidationErrors::collect(join_all(checks).await)
}

async fn check_line(
    product_exists: &dyn ProductCodeChecker,
    line_index: usize,
    line: &UnvalidatedOrderLine,
) -> Checked<ValidatedOrderLine> {
    let product_code = match ProductCode::parse(&line.product_code) {
        Ok(code) => {
            if product_exists.exists(&code).await {
                Ok(code)
            } else {
                fail(ValidationError::UnknownProductCode { line_index, code })
            }
        }
        Err(reason) => fail(ValidationError::InvalidProductCode {
            line_index,
            raw: line.product_code.clone(),
            reason,
        }),
    };

    let quantity = OrderQuantity::parse(line.quantity).map_err(|_| {
        ValidationErrors::new(ValidationError::NonPositiveQuantity {
            line_index,
            quantity: line.quantity,
        })
    });

    let (product_code, quantity) = ValidationErrors::zip(product_code, quantity)?;
    Ok(ValidatedOrderLine::new(product_code, quantity))
}

/// Returns (shipping, billing); billing defaults to the confirmed shipping address.
async fn check_addresses(
    address_exists: &dyn AddressChecker,
    shipping: &UnvalidatedAddress,
    billing: Option<&UnvalidatedAddress>,
) -> Checked<(ConfirmedAddress, ConfirmedAddress)> {
    let billing_check = async {
        match billing {
            Some(address) => {
                Some(check_address(address_exists, AddressRole::Billing, address).await)
            }
            None => None,
        }
    };

    let (shipping, billing) = join(
        check_address(address_exists, AddressRole::Shipping, shipping),
        billing_check,
    )
    .await;

    match billing {
        Some(billing) => ValidationErrors::zip(shipping, billing),
        None => shipping.map(|confirmed| (confirmed.clone(), confirmed)),
    }
}

async fn check_address(
    address_exists: &dyn AddressChecker,
    role: AddressRole,
    address: &UnvalidatedAddress,
) -> Checked<ConfirmedAddress> {
    address_exists.verify(address).await.map_err(|error| {
        tracing::debug!(role = %role, error = %error, "Address check rejected");
        ValidationErrors::new(ValidationError::from_address_check(role, error))
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
