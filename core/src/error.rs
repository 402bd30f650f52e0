//! Error types for the lesson shop.
//!
//! Local bookkeeping errors (`LedgerError`, `CartError`) never leave partial
//! state behind: when one is returned nothing was mutated.

use crate::types::LessonId;
use thiserror::Error;

/// Capacity ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The lesson is not in the ledger
    #[error("Lesson not found: {0}")]
    NotFound(LessonId),

    /// The lesson has no spaces left
    #[error("No spaces left for lesson {0}")]
    NoCapacity(LessonId),
}

/// Cart operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The lesson is unknown (to the ledger on add, to the cart on remove)
    #[error("Lesson not found: {0}")]
    NotFound(LessonId),

    /// The lesson has no spaces left
    #[error("No spaces left for lesson {0}")]
    NoCapacity(LessonId),

    /// The lesson is already selected
    #[error("Lesson {0} is already in the cart")]
    AlreadyInCart(LessonId),

    /// The cart is locked while an order is being placed
    #[error("Cart cannot change while a checkout is in progress")]
    CheckoutInProgress,
}

impl From<LedgerError> for CartError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::NotFound(id) => Self::NotFound(id),
            LedgerError::NoCapacity(id) => Self::NoCapacity(id),
        }
    }
}

/// Customer detail validation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty or contains something other than letters and spaces
    #[error("Name must contain only letters and spaces")]
    InvalidName,

    /// Phone is empty or contains something other than digits
    #[error("Phone must contain only digits")]
    InvalidPhone,
}

/// Remote catalog/order store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never got a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("Server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The response body could not be decoded
    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Checkout errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Customer details failed validation; nothing was sent
    #[error("Invalid customer details: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The order was not recorded; cart and capacities are untouched
    #[error("Order submission failed: {0}")]
    OrderSubmission(ApiError),

    /// Nothing to order
    #[error("Cart is empty")]
    EmptyCart,

    /// Another checkout has not finished yet
    #[error("A checkout is already in progress")]
    AlreadyInProgress,

    /// No outcome arrived in time; the checkout keeps running and may still succeed
    #[error("Checkout interrupted: {0}")]
    Interrupted(String),
}

/// Unrecognised sort text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseSortError {
    /// Not one of subject, price, spaces, location
    #[error("Unknown sort field: {0:?}")]
    UnknownField(String),

    /// Not asc/desc
    #[error("Unknown sort order: {0:?}")]
    UnknownOrder(String),
}
