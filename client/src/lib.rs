//! # Lesson Cart Client
//!
//! HTTP implementation of [`lesson_cart_core::environment::CatalogApi`].
//!
//! # Example
//!
//! ```no_run
//! use lesson_cart_client::CatalogClient;
//! use lesson_cart_core::environment::CatalogApi;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogClient::new("http://localhost:3000")?;
//! let lessons = client.fetch_lessons().await?;
//! println!("{} lessons", lessons.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::{CatalogClient, DEFAULT_TIMEOUT};
pub use error::ClientError;
