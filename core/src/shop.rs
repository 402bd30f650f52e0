//! The shop aggregate as a reducer.
//!
//! Ledger, cart, sort criterion, search query and checkout phase live in one
//! [`ShopState`], so every action sees (and leaves) them consistent with each
//! other. Remote calls are returned as effects; their results come back as
//! actions.
//!
//! Outcome notifications (`CartUpdated`, `CartRejected`, `CheckoutSucceeded`,
//! `CheckoutFailed`) are emitted as effects so callers waiting on the store
//! can observe them. Reducing them does nothing.

use crate::cart::Cart;
use crate::catalog::project;
use crate::checkout::{CheckoutPhase, CheckoutReceipt, SyncFailure, SyncFailureReason};
use crate::effect::Effect;
use crate::environment::{CatalogApi, Clock};
use crate::error::{ApiError, CartError, CheckoutError};
use crate::ledger::CapacityLedger;
use crate::reducer::Reducer;
use crate::types::{Lesson, LessonId, Money, OrderRequest, SortCriterion};
use crate::validation::CustomerDetails;
use crate::{async_effect, emit};
use std::sync::Arc;

/// Everything the shop knows locally
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShopState {
    /// Lessons and remaining spaces
    pub ledger: CapacityLedger,
    /// Current selection
    pub cart: Cart,
    /// Catalog view ordering
    pub sort: SortCriterion,
    /// Last search text as typed
    pub query: String,
    /// Current or last checkout
    pub checkout: CheckoutPhase,
    /// Number of checkout commands received, used as the attempt number
    pub checkout_attempts: u64,
}

impl ShopState {
    /// Ledger contents sorted by the current criterion
    #[must_use]
    pub fn catalog_view(&self) -> Vec<Lesson> {
        project(self.ledger.lessons(), self.sort)
    }

    /// Current cart total
    #[must_use]
    pub fn cart_total(&self) -> Money {
        self.cart.total()
    }
}

/// Shop actions: commands, effect results and outcome notifications
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShopAction {
    // Catalog
    /// Command: fetch the full catalog
    LoadCatalog,
    /// Result: catalog fetched
    CatalogLoaded {
        /// Lessons in server order
        lessons: Vec<Lesson>,
    },
    /// Result: catalog fetch failed
    CatalogLoadFailed {
        /// What went wrong
        error: ApiError,
    },
    /// Command: search the remote catalog (blank text reloads everything)
    Search {
        /// Search text as typed
        query: String,
    },
    /// Result: search answered
    SearchResults {
        /// Trimmed query that was sent
        query: String,
        /// Matching lessons
        lessons: Vec<Lesson>,
    },
    /// Result: search failed
    SearchFailed {
        /// Trimmed query that was sent
        query: String,
        /// What went wrong
        error: ApiError,
    },
    /// Command: change the catalog view ordering
    SetSort {
        /// New ordering
        criterion: SortCriterion,
    },

    // Cart
    /// Command: select a lesson
    AddToCart {
        /// Lesson to select
        lesson_id: LessonId,
    },
    /// Command: deselect a lesson
    RemoveFromCart {
        /// Lesson to deselect
        lesson_id: LessonId,
    },
    /// Notification: cart changed
    CartUpdated {
        /// Lesson added or removed
        lesson_id: LessonId,
        /// Its remaining spaces, if the ledger still has it
        spaces: Option<u32>,
    },
    /// Notification: cart change refused, nothing changed
    CartRejected {
        /// Lesson the command was for
        lesson_id: LessonId,
        /// Why
        error: CartError,
    },

    // Checkout
    /// Command: place an order for the cart
    Checkout {
        /// Customer name as entered
        name: String,
        /// Customer phone as entered
        phone: String,
    },
    /// Result: order recorded
    OrderAccepted {
        /// Checkout attempt
        attempt: u64,
    },
    /// Result: order refused or unreachable
    OrderRejected {
        /// Checkout attempt
        attempt: u64,
        /// What went wrong
        error: ApiError,
    },
    /// Result: one capacity update finished
    SpacesSynced {
        /// Checkout attempt
        attempt: u64,
        /// Lesson updated
        lesson_id: LessonId,
        /// Outcome
        result: Result<(), ApiError>,
    },
    /// Notification: checkout finished and the catalog was reloaded
    CheckoutSucceeded {
        /// Checkout attempt
        attempt: u64,
        /// Order summary
        receipt: CheckoutReceipt,
    },
    /// Notification: checkout did not complete
    CheckoutFailed {
        /// Checkout attempt the `Checkout` command was given
        attempt: u64,
        /// Why
        error: CheckoutError,
    },
}

/// Injected dependencies
#[derive(Clone)]
pub struct ShopEnvironment {
    /// Remote catalog and order store
    pub api: Arc<dyn CatalogApi>,
    /// Time source for receipts
    pub clock: Arc<dyn Clock>,
    /// Lessons to show when the catalog cannot be fetched
    pub fallback_catalog: Option<Vec<Lesson>>,
}

impl ShopEnvironment {
    /// Environment without a fallback catalog
    #[must_use]
    pub fn new(api: Arc<dyn CatalogApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            fallback_catalog: None,
        }
    }

    /// Show `lessons` when the catalog cannot be fetched
    #[must_use]
    pub fn with_fallback_catalog(mut self, lessons: Vec<Lesson>) -> Self {
        self.fallback_catalog = Some(lessons);
        self
    }
}

impl std::fmt::Debug for ShopEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopEnvironment")
            .field(
                "fallback_catalog",
                &self.fallback_catalog.as_ref().map(Vec::len),
            )
            .finish_non_exhaustive()
    }
}

/// The shop reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct ShopReducer;

impl ShopReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn load_catalog(env: &ShopEnvironment) -> Effect<ShopAction> {
        let api = Arc::clone(&env.api);
        async_effect! {
            match api.fetch_lessons().await {
                Ok(lessons) => Some(ShopAction::CatalogLoaded { lessons }),
                Err(error) => Some(ShopAction::CatalogLoadFailed { error }),
            }
        }
    }

    fn search(query: String, env: &ShopEnvironment) -> Effect<ShopAction> {
        let api = Arc::clone(&env.api);
        async_effect! {
            match api.search_lessons(&query).await {
                Ok(lessons) => Some(ShopAction::SearchResults { query, lessons }),
                Err(error) => Some(ShopAction::SearchFailed { query, error }),
            }
        }
    }

    fn cart_outcome(
        lesson_id: LessonId,
        result: Result<Option<u32>, CartError>,
    ) -> Vec<Effect<ShopAction>> {
        match result {
            Ok(spaces) => {
                tracing::debug!(%lesson_id, ?spaces, "Cart updated");
                vec![emit!(ShopAction::CartUpdated { lesson_id, spaces })]
            },
            Err(error) => {
                tracing::debug!(%lesson_id, %error, "Cart change rejected");
                vec![emit!(ShopAction::CartRejected { lesson_id, error })]
            },
        }
    }

    fn fail_checkout(
        state: &mut ShopState,
        attempt: u64,
        error: CheckoutError,
    ) -> Vec<Effect<ShopAction>> {
        tracing::info!(attempt, %error, "Checkout failed");
        state.checkout = CheckoutPhase::Failed(error.clone());
        vec![emit!(ShopAction::CheckoutFailed { attempt, error })]
    }

    fn begin_checkout(
        state: &mut ShopState,
        name: String,
        phone: String,
        env: &ShopEnvironment,
    ) -> Vec<Effect<ShopAction>> {
        state.checkout_attempts += 1;
        let attempt = state.checkout_attempts;

        if state.checkout.is_in_flight() {
            tracing::warn!(attempt, phase = state.checkout.name(), "Checkout already in progress");
            return vec![emit!(ShopAction::CheckoutFailed {
                attempt,
                error: CheckoutError::AlreadyInProgress,
            })];
        }

        let customer = match CustomerDetails::new(name, phone) {
            Ok(customer) => customer,
            Err(error) => {
                return Self::fail_checkout(state, attempt, CheckoutError::InvalidInput(error));
            },
        };
        if state.cart.is_empty() {
            return Self::fail_checkout(state, attempt, CheckoutError::EmptyCart);
        }

        let order = OrderRequest::new(customer, state.cart.entries().to_vec());
        tracing::info!(
            attempt,
            lessons = order.items().len(),
            total = %order.total(),
            "Submitting order"
        );
        state.checkout = CheckoutPhase::Submitting {
            attempt,
            order: order.clone(),
        };

        let api = Arc::clone(&env.api);
        vec![async_effect! {
            match api.submit_order(&order).await {
                Ok(()) => Some(ShopAction::OrderAccepted { attempt }),
                Err(error) => Some(ShopAction::OrderRejected { attempt, error }),
            }
        }]
    }

    /// Issue the next capacity update, or finish when none are left
    ///
    /// Lessons missing from the ledger are recorded as skipped without a
    /// request. The spaces sent are read from the ledger now, not when the
    /// order was built.
    fn sync_next(state: &mut ShopState, env: &ShopEnvironment) -> Vec<Effect<ShopAction>> {
        let CheckoutPhase::ItemsSyncing {
            attempt,
            pending,
            failures,
            ..
        } = &mut state.checkout
        else {
            return vec![Effect::None];
        };
        let attempt = *attempt;

        while let Some(lesson_id) = pending.front() {
            if let Some(spaces) = state.ledger.spaces(lesson_id) {
                let lesson_id = lesson_id.clone();
                tracing::debug!(attempt, %lesson_id, spaces, "Updating remote capacity");
                let api = Arc::clone(&env.api);
                return vec![async_effect! {
                    let result = api.update_spaces(&lesson_id, spaces).await;
                    Some(ShopAction::SpacesSynced { attempt, lesson_id, result })
                }];
            }
            tracing::warn!(attempt, %lesson_id, "Lesson no longer in ledger, skipping capacity update");
            if let Some(lesson_id) = pending.pop_front() {
                failures.push(SyncFailure {
                    lesson_id,
                    reason: SyncFailureReason::Skipped,
                });
            }
        }

        Self::finish_checkout(state, env)
    }

    fn finish_checkout(state: &mut ShopState, env: &ShopEnvironment) -> Vec<Effect<ShopAction>> {
        match std::mem::take(&mut state.checkout) {
            CheckoutPhase::ItemsSyncing {
                attempt,
                order,
                failures,
                ..
            } => {
                let receipt = CheckoutReceipt::new(attempt, &order, env.clock.now(), failures);
                tracing::info!(
                    customer = %receipt.customer_name,
                    lessons = receipt.lesson_count,
                    total = %receipt.total,
                    sync_failures = receipt.sync_failures.len(),
                    "Checkout succeeded"
                );
                state.cart.clear();
                state.checkout = CheckoutPhase::Succeeded(receipt.clone());

                // Reload first so the notification goes out against fresh capacity
                vec![Effect::Sequential(vec![
                    Self::load_catalog(env),
                    emit!(ShopAction::CheckoutSucceeded { attempt, receipt }),
                ])]
            },
            other => {
                state.checkout = other;
                vec![Effect::None]
            },
        }
    }
}

impl Reducer for ShopReducer {
    type State = ShopState;
    type Action = ShopAction;
    type Environment = ShopEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Vec<Effect<Self::Action>> {
        match action {
            ShopAction::LoadCatalog => vec![Self::load_catalog(env)],

            ShopAction::CatalogLoaded { lessons } => {
                state.ledger.load(lessons);
                vec![Effect::None]
            },

            ShopAction::CatalogLoadFailed { error } => {
                if let Some(fallback) = &env.fallback_catalog {
                    tracing::warn!(%error, lessons = fallback.len(), "Catalog load failed, using fallback catalog");
                    state.ledger.load(fallback.iter().cloned());
                } else {
                    tracing::warn!(%error, "Catalog load failed, keeping current catalog");
                }
                vec![Effect::None]
            },

            ShopAction::Search { query } => {
                let trimmed = query.trim().to_string();
                state.query = query;
                if trimmed.is_empty() {
                    vec![Self::load_catalog(env)]
                } else {
                    vec![Self::search(trimmed, env)]
                }
            },

            ShopAction::SearchResults { query, lessons } => {
                if lessons.is_empty() {
                    tracing::debug!(%query, "No matches, keeping current catalog");
                } else {
                    tracing::debug!(%query, matches = lessons.len(), "Search results");
                    state.ledger.load(lessons);
                }
                vec![Effect::None]
            },

            ShopAction::SearchFailed { query, error } => {
                tracing::warn!(%query, %error, "Search failed, reloading full catalog");
                vec![Self::load_catalog(env)]
            },

            ShopAction::SetSort { criterion } => {
                state.sort = criterion;
                vec![Effect::None]
            },

            ShopAction::AddToCart { lesson_id } => {
                let result = if state.checkout.is_in_flight() {
                    Err(CartError::CheckoutInProgress)
                } else {
                    state.cart.add(&lesson_id, &mut state.ledger).map(Some)
                };
                Self::cart_outcome(lesson_id, result)
            },

            ShopAction::RemoveFromCart { lesson_id } => {
                let result = if state.checkout.is_in_flight() {
                    Err(CartError::CheckoutInProgress)
                } else {
                    state
                        .cart
                        .remove(&lesson_id, &mut state.ledger)
                        .map(|_| state.ledger.spaces(&lesson_id))
                };
                Self::cart_outcome(lesson_id, result)
            },

            ShopAction::Checkout { name, phone } => Self::begin_checkout(state, name, phone, env),

            ShopAction::OrderAccepted { attempt } => match std::mem::take(&mut state.checkout) {
                CheckoutPhase::Submitting {
                    attempt: current,
                    order,
                } if current == attempt => {
                    tracing::info!(attempt, "Order accepted, syncing capacity");
                    let pending = order.items().iter().map(|entry| entry.id.clone()).collect();
                    state.checkout = CheckoutPhase::ItemsSyncing {
                        attempt,
                        order,
                        pending,
                        failures: Vec::new(),
                    };
                    Self::sync_next(state, env)
                },
                other => {
                    tracing::warn!(attempt, phase = other.name(), "Ignoring stale order acceptance");
                    state.checkout = other;
                    vec![Effect::None]
                },
            },

            ShopAction::OrderRejected { attempt, error } => {
                if state.checkout.attempt() == Some(attempt)
                    && matches!(state.checkout, CheckoutPhase::Submitting { .. })
                {
                    Self::fail_checkout(state, attempt, CheckoutError::OrderSubmission(error))
                } else {
                    tracing::warn!(attempt, %error, phase = state.checkout.name(), "Ignoring stale order rejection");
                    vec![Effect::None]
                }
            },

            ShopAction::SpacesSynced {
                attempt,
                lesson_id,
                result,
            } => {
                let CheckoutPhase::ItemsSyncing {
                    attempt: current,
                    pending,
                    failures,
                    ..
                } = &mut state.checkout
                else {
                    tracing::warn!(attempt, %lesson_id, phase = state.checkout.name(), "Ignoring stale capacity update");
                    return vec![Effect::None];
                };
                if *current != attempt || pending.front() != Some(&lesson_id) {
                    tracing::warn!(attempt, %lesson_id, "Ignoring stale capacity update");
                    return vec![Effect::None];
                }
                pending.pop_front();
                match result {
                    Ok(()) => tracing::debug!(attempt, %lesson_id, "Remote capacity updated"),
                    Err(error) => {
                        tracing::warn!(attempt, %lesson_id, %error, "Remote capacity update failed");
                        failures.push(SyncFailure {
                            lesson_id,
                            reason: SyncFailureReason::Api(error),
                        });
                    },
                }
                Self::sync_next(state, env)
            },

            ShopAction::CartUpdated { .. }
            | ShopAction::CartRejected { .. }
            | ShopAction::CheckoutSucceeded { .. }
            | ShopAction::CheckoutFailed { .. } => vec![Effect::None],
        }
    }
}
