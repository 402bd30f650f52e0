//! Shop metrics.
//!
//! ## Counters
//! - `store.effects.executed{type}` - Effects started by the store runtime
//! - `shop.cart.rejected` - Add/remove requests refused
//! - `shop.checkout.completed` - Checkouts that placed an order
//! - `shop.checkout.failed` - Checkouts that did not
//! - `shop.checkout.sync_failures` - Capacity updates that failed or were skipped
//!
//! Recording works without an installed recorder; values are then dropped.

use metrics::describe_counter;

/// Cart requests refused
pub const CART_REJECTED: &str = "shop.cart.rejected";
/// Checkouts that placed an order
pub const CHECKOUT_COMPLETED: &str = "shop.checkout.completed";
/// Checkouts that did not place an order
pub const CHECKOUT_FAILED: &str = "shop.checkout.failed";
/// Capacity updates not applied remotely
pub const CHECKOUT_SYNC_FAILURES: &str = "shop.checkout.sync_failures";

/// Register metric descriptions with the installed recorder.
///
/// Call once at startup, after installing a recorder.
pub fn register_metrics() {
    describe_counter!(
        "store.effects.executed",
        "Effects started by the store runtime, by type (none, future, sequential)"
    );
    describe_counter!(CART_REJECTED, "Add or remove requests refused by the cart");
    describe_counter!(CHECKOUT_COMPLETED, "Checkouts whose order was accepted");
    describe_counter!(
        CHECKOUT_FAILED,
        "Checkouts that failed validation, were refused or were interrupted"
    );
    describe_counter!(
        CHECKOUT_SYNC_FAILURES,
        "Per-lesson capacity updates that failed or were skipped after an accepted order"
    );
}
