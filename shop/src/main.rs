//! Lesson Shop demo
//!
//! Scripted session against a lesson catalog service: load the catalog,
//! show it by price, fill a cart, try a few things the cart refuses, check
//! out and show the refreshed catalog.
//!
//! # Usage
//!
//! ```bash
//! # Against a running backend (or the built-in catalog if unreachable)
//! LESSON_SHOP_API_ROOT=http://localhost:3000 cargo run --bin lesson-shop -- "Ada Lovelace" 07123456789
//! ```

use anyhow::Context;
use lesson_cart_core::{Lesson, SortCriterion, SortField};
use lesson_shop::{ShopApp, ShopConfig, ShopError};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lesson_cart=debug,lesson_shop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
    lesson_shop::metrics::register_metrics();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "Ada Lovelace".to_string());
    let phone = args.next().unwrap_or_else(|| "07123456789".to_string());

    let config = ShopConfig::from_env();
    tracing::info!(api_root = %config.api_root, "Configuration loaded");
    let app = ShopApp::connect(&config).context("creating shop session")?;

    let count = app.load_catalog().await.context("loading catalog")?;
    println!("\n{count} lessons available, most expensive first:");
    app.set_sort(SortCriterion::descending(SortField::Price)).await?;
    print_catalog(&app.catalog_view().await);

    println!("\nFilling the cart:");
    let purchasable: Vec<Lesson> = app
        .catalog_view()
        .await
        .into_iter()
        .filter(|lesson| lesson.spaces > 0)
        .take(2)
        .collect();
    for lesson in &purchasable {
        let spaces = app.add_to_cart(&lesson.id).await?;
        println!("  + {} in {} ({} left)", lesson.subject, lesson.location, spaces);
    }
    if let Some(lesson) = purchasable.first() {
        match app.add_to_cart(&lesson.id).await {
            Err(ShopError::Cart(error)) => println!("  ! {error}"),
            other => println!("  ? unexpected {other:?}"),
        }
    }
    println!("  Cart total: {}", app.cart_total().await);

    match app.checkout(&name, "not a number").await {
        Err(error) => println!("\nCheckout with a bad phone number: {error}"),
        Ok(receipt) => println!("\nUnexpectedly placed order {receipt:?}"),
    }

    println!("\nChecking out as {name}...");
    match app.checkout(&name, &phone).await {
        Ok(receipt) => {
            println!(
                "  Booked {} lessons for {}, total {}",
                receipt.lesson_count, receipt.customer_name, receipt.total
            );
            for failure in &receipt.sync_failures {
                println!("  ! lesson {} not updated remotely: {}", failure.lesson_id, failure.reason);
            }
        },
        Err(error) => println!("  Checkout failed: {error}"),
    }

    println!("\nCatalog after checkout:");
    print_catalog(&app.catalog_view().await);

    app.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}

fn print_catalog(lessons: &[Lesson]) {
    for lesson in lessons {
        println!(
            "  {:>4}  {:<10} {:<12} {:>8}  {} spaces",
            lesson.id.as_str(),
            lesson.subject,
            lesson.location,
            lesson.price.to_string(),
            lesson.spaces
        );
    }
}
