//! Error types for building the catalog client

use thiserror::Error;

/// Errors that can occur when constructing a [`crate::CatalogClient`]
///
/// Request failures are reported per call as
/// [`lesson_cart_core::ApiError`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API root is not an absolute http(s) URL
    #[error("Invalid API root {url:?}: {reason}")]
    InvalidBaseUrl {
        /// URL as configured
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// The underlying HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}
