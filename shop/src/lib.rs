//! # Lesson Shop
//!
//! The shop as an application: a [`ShopApp`] owns the store running the
//! shop reducer, a debouncer for search-as-you-type and, when built with
//! [`ShopApp::connect`], an HTTP client for the remote catalog.
//!
//! ```no_run
//! use lesson_shop::{ShopApp, ShopConfig};
//!
//! # async fn example() -> Result<(), lesson_shop::ShopError> {
//! let app = ShopApp::connect(&ShopConfig::from_env())?;
//! app.load_catalog().await?;
//! let view = app.catalog_view().await;
//! app.add_to_cart(&view[0].id).await?;
//! let receipt = app.checkout("Ada Lovelace", "07123456789").await?;
//! println!("Booked {} lessons for {}", receipt.lesson_count, receipt.total);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod fallback;
pub mod metrics;

pub use app::{ShopApp, ShopError, ShopSettings, ShopStore};
pub use config::ShopConfig;
pub use fallback::demo_catalog;
