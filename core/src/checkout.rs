//! Checkout state machine.
//!
//! ```text
//!  Idle ──Checkout──► Submitting ──OrderAccepted──► ItemsSyncing ──last SpacesSynced──► Succeeded
//!   ▲                    │
//!   │              OrderRejected
//!   │                    ▼
//!   └───── Checkout ── Failed
//! ```
//!
//! Every `Checkout` command gets an attempt number. Results and outcome
//! notifications carry it, so a response for one attempt cannot drive or
//! answer another. Once the order is accepted the checkout always runs on to
//! `Succeeded`, however late the acceptance arrives.

use crate::error::{ApiError, CheckoutError};
use crate::types::{LessonId, Money, OrderRequest};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use thiserror::Error;

/// Where the current (or last) checkout is
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// No checkout has run yet
    #[default]
    Idle,

    /// The order request is outstanding
    Submitting {
        /// Attempt number
        attempt: u64,
        /// The order as sent
        order: OrderRequest,
    },

    /// The order is recorded; capacity updates are being sent one at a time
    ItemsSyncing {
        /// Attempt number
        attempt: u64,
        /// The order as sent
        order: OrderRequest,
        /// Lessons still to update, front is the one in flight
        pending: VecDeque<LessonId>,
        /// Updates that failed or were skipped so far
        failures: Vec<SyncFailure>,
    },

    /// The order was placed and the cart cleared
    Succeeded(CheckoutReceipt),

    /// The checkout did not complete
    Failed(CheckoutError),
}

impl CheckoutPhase {
    /// Whether a checkout is running (cart is locked)
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitting { .. } | Self::ItemsSyncing { .. })
    }

    /// Attempt number of the running checkout
    #[must_use]
    pub const fn attempt(&self) -> Option<u64> {
        match self {
            Self::Submitting { attempt, .. } | Self::ItemsSyncing { attempt, .. } => Some(*attempt),
            Self::Idle | Self::Succeeded(_) | Self::Failed(_) => None,
        }
    }

    /// Receipt of a successful checkout
    #[must_use]
    pub const fn receipt(&self) -> Option<&CheckoutReceipt> {
        match self {
            Self::Succeeded(receipt) => Some(receipt),
            _ => None,
        }
    }

    /// Why the last checkout failed
    #[must_use]
    pub const fn error(&self) -> Option<&CheckoutError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting { .. } => "submitting",
            Self::ItemsSyncing { .. } => "items_syncing",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Why a capacity update did not happen
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncFailureReason {
    /// The lesson was no longer in the ledger, so no request was made
    #[error("lesson is not in the local catalog")]
    Skipped,

    /// The request failed
    #[error(transparent)]
    Api(ApiError),
}

/// One capacity update that did not go through
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncFailure {
    /// Lesson whose spaces were not updated remotely
    pub lesson_id: LessonId,
    /// What went wrong
    pub reason: SyncFailureReason,
}

/// Summary of a placed order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// Checkout attempt that placed the order
    pub attempt: u64,
    /// Name the order was placed under
    pub customer_name: String,
    /// Number of lessons ordered
    pub lesson_count: usize,
    /// Order total
    pub total: Money,
    /// When syncing finished
    pub placed_at: DateTime<Utc>,
    /// Capacity updates that failed or were skipped
    pub sync_failures: Vec<SyncFailure>,
}

impl CheckoutReceipt {
    pub(crate) fn new(
        attempt: u64,
        order: &OrderRequest,
        placed_at: DateTime<Utc>,
        sync_failures: Vec<SyncFailure>,
    ) -> Self {
        Self {
            attempt,
            customer_name: order.customer_name().to_string(),
            lesson_count: order.items().len(),
            total: order.total(),
            placed_at,
            sync_failures,
        }
    }

    /// Whether every capacity update went through
    #[must_use]
    pub fn fully_synced(&self) -> bool {
        self.sync_failures.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CartEntry, Lesson};
    use crate::validation::CustomerDetails;

    fn order() -> OrderRequest {
        let lesson = Lesson::new("1", "Art", "Manchester", Money::from_pounds(75), 2);
        OrderRequest::new(
            CustomerDetails::new("Ada", "0123").unwrap(),
            vec![CartEntry::from(&lesson)],
        )
    }

    #[test]
    fn test_in_flight_phases() {
        assert!(!CheckoutPhase::Idle.is_in_flight());
        assert!(CheckoutPhase::Submitting { attempt: 1, order: order() }.is_in_flight());
        let syncing = CheckoutPhase::ItemsSyncing {
            attempt: 2,
            order: order(),
            pending: VecDeque::new(),
            failures: Vec::new(),
        };
        assert!(syncing.is_in_flight());
        assert_eq!(syncing.attempt(), Some(2));
        assert!(!CheckoutPhase::Failed(CheckoutError::EmptyCart).is_in_flight());
        assert_eq!(CheckoutPhase::Failed(CheckoutError::EmptyCart).attempt(), None);
    }

    #[test]
    fn test_receipt_from_order() {
        let placed_at = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let receipt = CheckoutReceipt::new(3, &order(), placed_at, Vec::new());

        assert_eq!(receipt.attempt, 3);
        assert_eq!(receipt.customer_name, "Ada");
        assert_eq!(receipt.lesson_count, 1);
        assert_eq!(receipt.total, Money::from_pounds(75));
        assert!(receipt.fully_synced());
    }
}
