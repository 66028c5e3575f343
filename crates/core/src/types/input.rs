//! Validation errors for operation inputs.

/// Errors raised when an operation input is rejected before any I/O.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A required field was missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// The buyer email does not have a local part and a domain.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// A line item quantity was zero or negative.
    #[error("invalid quantity {quantity} for {variant_id}")]
    InvalidQuantity {
        /// Variant the quantity was requested for.
        variant_id: String,
        /// The rejected quantity.
        quantity: i64,
    },
    /// A price was negative.
    #[error("price cannot be negative")]
    NegativePrice,
    /// An update carried no fields.
    #[error("update contains no changes")]
    EmptyUpdate,
}
