use serde::{Deserialize, Serialize};

use super::errors::{PricingError, PricingErrorKind};
use super::value_objects::{
    BillingAmount, ConfirmedAddress, CustomerInfo, OrderId, OrderQuantity, Price, ProductCode,
};

// ============================================================================
// Order State Model
// ============================================================================
//
//   UnvalidatedOrder --validate_order--> ValidatedOrder --price_order--> PricedOrder
//
// Each state is its own type. Validated and priced orders have crate-private
// constructors, so the only way to obtain one is through the step that
// produces it. They serialize (for events) but never deserialize.
//
// ============================================================================

// ----------------------------------------------------------------------------
// Unvalidated (raw external input)
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnvalidatedCustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnvalidatedAddress {
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub zip_code: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnvalidatedOrderLine {
    pub product_code: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnvalidatedOrder {
    pub order_id: String,
    pub customer_info: UnvalidatedCustomerInfo,
    pub shipping_address: UnvalidatedAddress,
    /// Falls back to the confirmed shipping address when absent
    #[serde(default)]
    pub billing_address: Option<UnvalidatedAddress>,
    pub lines: Vec<UnvalidatedOrderLine>,
}

// ----------------------------------------------------------------------------
// Validated
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedOrderLine {
    product_code: ProductCode,
    quantity: OrderQuantity,
}

impl ValidatedOrderLine {
    pub(crate) fn new(product_code: ProductCode, quantity: OrderQuantity) -> Self {
        Self { product_code, quantity }
    }

    pub fn product_code(&self) -> &ProductCode {
        &self.product_code
    }

    pub fn quantity(&self) -> OrderQuantity {
        self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedOrder {
    order_id: OrderId,
    customer_info: CustomerInfo,
    shipping_address: ConfirmedAddress,
    billing_address: ConfirmedAddress,
    lines: Vec<ValidatedOrderLine>,
}

impl ValidatedOrder {
    pub(crate) fn new(
        order_id: OrderId,
        customer_info: CustomerInfo,
        shipping_address: ConfirmedAddress,
        billing_address: ConfirmedAddress,
        lines: Vec<ValidatedOrderLine>,
    ) -> Self {
        Self {
            order_id,
            customer_info,
            shipping_address,
            billing_address,
            lines,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn customer_info(&self) -> &CustomerInfo {
        &self.customer_info
    }

    pub fn shipping_address(&self) -> &ConfirmedAddress {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> &ConfirmedAddress {
        &self.billing_address
    }

    pub fn lines(&self) -> &[ValidatedOrderLine] {
        &self.lines
    }

    /// Hands the parts over to the pricing step, which rebuilds them into a `PricedOrder`.
    pub(crate) fn into_parts(
        self,
    ) -> (OrderId, CustomerInfo, ConfirmedAddress, ConfirmedAddress, Vec<ValidatedOrderLine>) {
        (
            self.order_id,
            self.customer_info,
            self.shipping_address,
            self.billing_address,
            self.lines,
        )
    }
}

// ----------------------------------------------------------------------------
// Priced
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedOrderLine {
    product_code: ProductCode,
    quantity: OrderQuantity,
    unit_price: Price,
    line_price: Price,
}

impl PricedOrderLine {
    /// The line price is always derived from the unit price, never supplied.
    /// `None` when it overflows.
    pub(crate) fn new(line: ValidatedOrderLine, unit_price: Price) -> Option<Self> {
        let line_price = unit_price.times(line.quantity)?;
        Some(Self {
            product_code: line.product_code,
            quantity: line.quantity,
            unit_price,
            line_price,
        })
    }

    pub fn product_code(&self) -> &ProductCode {
        &self.product_code
    }

    pub fn quantity(&self) -> OrderQuantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Price {
        self.unit_price
    }

    pub fn line_price(&self) -> Price {
        self.line_price
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedOrder {
    order_id: OrderId,
    customer_info: CustomerInfo,
    shipping_address: ConfirmedAddress,
    billing_address: ConfirmedAddress,
    lines: Vec<PricedOrderLine>,
    amount_to_bill: BillingAmount,
}

impl PricedOrder {
    /// The total is always recomputed from the lines. Fails on the first
    /// line that no longer fits in the total.
    pub(crate) fn new(
        order_id: OrderId,
        customer_info: CustomerInfo,
        shipping_address: ConfirmedAddress,
        billing_address: ConfirmedAddress,
        lines: Vec<PricedOrderLine>,
    ) -> Result<Self, PricingError> {
        let mut amount_to_bill = BillingAmount::zero();
        for (line_index, line) in lines.iter().enumerate() {
            let Some(total) = amount_to_bill.checked_add(line.line_price) else {
                return Err(PricingError {
                    line_index,
                    product_code: line.product_code.clone(),
                    kind: PricingErrorKind::Overflow,
                });
            };
            amount_to_bill = total;
        }

        Ok(Self {
            order_id,
            customer_info,
            shipping_address,
            billing_address,
            lines,
            amount_to_bill,
        })
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn customer_info(&self) -> &CustomerInfo {
        &self.customer_info
    }

    pub fn shipping_address(&self) -> &ConfirmedAddress {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> &ConfirmedAddress {
        &self.billing_address
    }

    pub fn lines(&self) -> &[PricedOrderLine] {
        &self.lines
    }

    pub fn amount_to_bill(&self) -> BillingAmount {
        self.amount_to_bill
    }
}

// ----------------------------------------------------------------------------
// Lifecycle union
// ----------------------------------------------------------------------------

/// An order at one of its lifecycle stages. Placed is not stored: it is
/// marked by the emitted events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderState {
    Unvalidated(UnvalidatedOrder),
    Validated(ValidatedOrder),
    Priced(PricedOrder),
}

impl OrderState {
    pub fn stage_name(&self) -> &'static str {
        match self {
            OrderState::Unvalidated(_) => "Unvalidated",
            OrderState::Validated(_) => "Validated",
            OrderState::Priced(_) => "Priced",
        }
    }

    /// Raw id for unvalidated orders, typed id afterwards
    pub fn order_id(&self) -> &str {
        match self {
            OrderState::Unvalidated(order) => &order.order_id,
            OrderState::Validated(order) => order.order_id().as_str(),
            OrderState::Priced(order) => order.order_id().as_str(),
        }
    }
}

impl From<UnvalidatedOrder> for OrderState {
    fn from(order: UnvalidatedOrder) -> Self {
        OrderState::Unvalidated(order)
    }
}

impl From<ValidatedOrder> for OrderState {
    fn from(order: ValidatedOrder) -> Self {
        OrderState::Validated(order)
    }
}

impl From<PricedOrder> for OrderState {
    fn from(order: PricedOrder) -> Self {
        OrderState::Priced(order)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_unvalidated_order_deserializes_without_billing_address() {
        let json = r#"{
            "order_id": "O1",
            "customer_info": {
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email_address": "ada@example.com"
            },
            "shipping_address": {
                "address_line1": "1 Main St",
                "city": "Springfield",
                "zip_code": "12345",
                "state": "IL",
                "country": "US"
            },
            "lines": [{"product_code": "P1", "quantity": 2}]
        }"#;

        let order: UnvalidatedOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, "O1");
        assert!(order.billing_address.is_none());
        assert_eq!(order.shipping_address.address_line2, "");
        assert_eq!(order.lines.len(), 1);
    }

    #[test]
    fn test_priced_order_total_is_derived_from_lines() {
        let (order_id, customer_info, shipping, billing, lines) =
            validated_order("O1", &[("P1", 2), ("P2", 3)]).into_parts();
        let unit = Price::new(Decimal::new(150, 2)).unwrap();
        let priced_lines = lines
            .into_iter()
            .map(|line| PricedOrderLine::new(line, unit).unwrap())
            .collect();

        let priced =
            PricedOrder::new(order_id, customer_info, shipping, billing, priced_lines).unwrap();

        assert_eq!(priced.lines()[0].line_price().value(), Decimal::new(300, 2));
        assert_eq!(priced.amount_to_bill().value(), Decimal::new(750, 2));
    }

    #[test]
    fn test_order_state_reports_stage() {
        let unvalidated = OrderState::from(unvalidated_order("O1", &[("P1", 1)]));
        let validated = OrderState::from(validated_order("O2", &[("P1", 1)]));

        assert_eq!(unvalidated.stage_name(), "Unvalidated");
        assert_eq!(unvalidated.order_id(), "O1");
        assert_eq!(validated.stage_name(), "Validated");
        assert_eq!(validated.order_id(), "O2");
    }
}
