use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ValueError;

// ============================================================================
// Order Value Objects
// ============================================================================
//
// Constrained primitives used by the validated and priced order states.
// Each one can only be built through its checked constructor.
//
// ============================================================================

pub const MAX_ORDER_ID_LEN: usize = 50;
pub const MAX_NAME_LEN: usize = 50;

fn non_blank(field: &'static str, raw: &str) -> Result<String, ValueError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValueError::Empty { field });
    }
    Ok(trimmed.to_string())
}

fn bounded(field: &'static str, raw: &str, max: usize) -> Result<String, ValueError> {
    let value = non_blank(field, raw)?;
    if value.chars().count() > max {
        return Err(ValueError::TooLong { field, max });
    }
    Ok(value)
}

/// Order identifier: non-empty, at most 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OrderId(String);

impl OrderId {
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        bounded("order_id", raw, MAX_ORDER_ID_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog product code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ProductCode(String);

impl ProductCode {
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        let value = non_blank("product_code", raw)?;
        if value.chars().any(char::is_whitespace) {
            return Err(ValueError::InvalidFormat {
                field: "product_code",
                reason: "must not contain whitespace".to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductCode {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strictly positive line quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderQuantity(u32);

impl OrderQuantity {
    pub fn parse(raw: i32) -> Result<Self, ValueError> {
        if raw <= 0 {
            return Err(ValueError::NonPositive { field: "quantity", value: raw });
        }
        Ok(Self(raw as u32))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Non-negative unit or line price
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self, ValueError> {
        if value < Decimal::ZERO {
            return Err(ValueError::Negative { field: "price" });
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price, or `None` when the
    /// product no longer fits in a `Decimal`.
    pub fn times(&self, quantity: OrderQuantity) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity.value())).map(Self)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ValueError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Amount billed for a priced order: the sum of its line prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingAmount(Decimal);

impl BillingAmount {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// `None` on overflow
    pub fn checked_add(self, price: Price) -> Option<Self> {
        self.0.checked_add(price.value()).map(Self)
    }

    pub fn sum<'a>(prices: impl IntoIterator<Item = &'a Price>) -> Option<Self> {
        prices
            .into_iter()
            .try_fold(Self::zero(), |total, price| total.checked_add(*price))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for BillingAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Customer email address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        let value = non_blank("email_address", raw)?;
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self(value)),
            _ => Err(ValueError::InvalidFormat {
                field: "email_address",
                reason: "must look like local@domain".to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Personal name component, non-empty and at most 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct String50(String);

impl String50 {
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, ValueError> {
        bounded(field, raw, MAX_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
    pub first_name: String50,
    pub last_name: String50,
    pub email_address: EmailAddress,
}

/// Address as confirmed (and possibly normalized) by the address service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedAddress {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub zip_code: String,
    pub state: String,
    pub country: String,
}

impl fmt::Display for ConfirmedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_line1)?;
        if let Some(line2) = &self.address_line2 {
            write!(f, ", {}", line2)?;
        }
        write!(f, ", {} {} {}, {}", self.city, self.state, self.zip_code, self.country)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
