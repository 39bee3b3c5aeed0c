use serde::Serialize;
use std::fmt;

use crate::utils::IsTransient;
use super::value_objects::ProductCode;

// ============================================================================
// Order Workflow Errors
// ============================================================================
//
// Validation accumulates many `ValidationError`s into `ValidationErrors`.
// Pricing stops at the first `PricingError`.
// `PlaceOrderError` is the only error type returned by the public workflow.
//
// ============================================================================

/// Value object construction failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must not be more than {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: &'static str, reason: String },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: i32 },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },
}

/// Which of the order's addresses a check refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressRole {
    Shipping,
    Billing,
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressRole::Shipping => f.write_str("shipping"),
            AddressRole::Billing => f.write_str("billing"),
        }
    }
}

/// Failure reported by the address verification service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressCheckError {
    #[error("Address not found")]
    AddressNotFound,

    #[error("Address is malformed: {0}")]
    InvalidFormat(String),

    #[error("Address service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Address service timed out")]
    Timeout,
}

impl IsTransient for AddressCheckError {
    fn is_transient(&self) -> bool {
        matches!(self, AddressCheckError::ServiceUnavailable(_) | AddressCheckError::Timeout)
    }
}

/// One violated validation rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Order id is missing")]
    MissingOrderId,

    #[error("Invalid order id: {0}")]
    InvalidOrderId(ValueError),

    #[error("Invalid customer info: {0}")]
    InvalidCustomerInfo(ValueError),

    #[error("Order has no lines")]
    EmptyOrder,

    #[error("Line {line_index}: invalid product code {raw:?}: {reason}")]
    InvalidProductCode {
        line_index: usize,
        raw: String,
        reason: ValueError,
    },

    #[error("Line {line_index}: unknown product code {code}")]
    UnknownProductCode { line_index: usize, code: ProductCode },

    #[error("Line {line_index}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity { line_index: usize, quantity: i32 },

    #[error("Invalid {role} address: {reason}")]
    InvalidAddress { role: AddressRole, reason: AddressCheckError },

    #[error("Could not verify {role} address: {source}")]
    AddressCheckFailed {
        role: AddressRole,
        source: AddressCheckError,
    },
}

impl ValidationError {
    /// True when the error stems from an unreachable collaborator rather than bad input
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ValidationError::AddressCheckFailed { .. })
    }

    pub(crate) fn from_address_check(role: AddressRole, error: AddressCheckError) -> Self {
        if error.is_transient() {
            ValidationError::AddressCheckFailed { role, source: error }
        } else {
            ValidationError::InvalidAddress { role, reason: error }
        }
    }
}

/// Non-empty, ordered collection of validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    first: ValidationError,
    rest: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new(first: ValidationError) -> Self {
        Self { first, rest: Vec::new() }
    }

    /// Returns `None` for an empty list
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        let mut iter = errors.into_iter();
        let first = iter.next()?;
        Some(Self { first, rest: iter.collect() })
    }

    pub fn first(&self) -> &ValidationError {
        &self.first
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        let mut all = Vec::with_capacity(1 + self.rest.len());
        all.push(self.first);
        all.extend(self.rest);
        all
    }

    pub fn has_infrastructure_failure(&self) -> bool {
        self.iter().any(ValidationError::is_infrastructure)
    }

    fn extend(&mut self, other: ValidationErrors) {
        self.rest.extend(other.into_vec());
    }

    /// Pair two independent checks, keeping the errors of both (left first)
    pub(crate) fn zip<A, B>(left: Result<A, Self>, right: Result<B, Self>) -> Result<(A, B), Self> {
        match (left, right) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(errors), Ok(_)) | (Ok(_), Err(errors)) => Err(errors),
            (Err(mut errors), Err(more)) => {
                errors.extend(more);
                Err(errors)
            }
        }
    }

    /// Gather a sequence of independent checks, keeping every error in sequence order
    pub(crate) fn collect<T>(
        checks: impl IntoIterator<Item = Result<T, Self>>,
    ) -> Result<Vec<T>, Self> {
        checks.into_iter().fold(Ok(Vec::new()), |acc, next| {
            Self::zip(acc, next).map(|(mut values, value)| {
                values.push(value);
                values
            })
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s): ", self.len())?;
        for (i, error) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Failure reported by the pricing service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceLookupError {
    #[error("No price for product {0}")]
    ProductNotFound(ProductCode),

    #[error("Pricing service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IsTransient for PriceLookupError {
    fn is_transient(&self) -> bool {
        matches!(self, PriceLookupError::ServiceUnavailable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingErrorKind {
    UnknownProduct,
    LookupFailed(String),
    /// Line price or running total exceeds the representable amount
    Overflow,
}

/// First line that could not be priced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot price line {line_index} ({product_code}): {kind}")]
pub struct PricingError {
    pub line_index: usize,
    pub product_code: ProductCode,
    pub kind: PricingErrorKind,
}

impl fmt::Display for PricingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingErrorKind::UnknownProduct => f.write_str("product has no price"),
            PricingErrorKind::LookupFailed(reason) => write!(f, "price lookup failed: {}", reason),
            PricingErrorKind::Overflow => f.write_str("amount out of range"),
        }
    }
}

/// Error returned by the place-order workflow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceOrderError {
    #[error("Order rejected: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Order could not be priced: {0}")]
    Pricing(#[from] PricingError),
}

impl PlaceOrderError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PlaceOrderError::Validation(_) => "validation",
            PlaceOrderError::Pricing(_) => "pricing",
        }
    }
}
