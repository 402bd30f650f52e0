//! The shop application facade.
//!
//! [`ShopApp`] turns the action/notification protocol of the shop reducer
//! into request/response calls with typed results, which is what a UI layer
//! wants: "add this lesson" either returns the remaining spaces or says why
//! not.

use crate::config::ShopConfig;
use crate::fallback::demo_catalog;
use crate::metrics::{CART_REJECTED, CHECKOUT_COMPLETED, CHECKOUT_FAILED, CHECKOUT_SYNC_FAILURES};
use lesson_cart_client::{CatalogClient, ClientError};
use lesson_cart_core::environment::SystemClock;
use lesson_cart_core::{
    ApiError, CartEntry, CartError, CheckoutError, CheckoutPhase, CheckoutReceipt, Lesson,
    LessonId, Money, ShopAction, ShopEnvironment, ShopReducer, ShopState, SortCriterion,
};
use lesson_cart_runtime::{Debouncer, Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};

/// The store type behind [`ShopApp`]
pub type ShopStore = Store<ShopState, ShopAction, ShopEnvironment, ShopReducer>;

/// Errors returned by [`ShopApp`] operations
#[derive(Error, Debug)]
pub enum ShopError {
    /// Cart change refused; nothing changed
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Checkout did not complete
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Remote catalog call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Store runtime failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// HTTP client could not be built
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Timing policy for a [`ShopApp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopSettings {
    /// Quiet period before search text is sent
    pub search_debounce: Duration,
    /// How long [`ShopApp::checkout`] waits for an outcome
    pub checkout_timeout: Duration,
    /// How long to wait for the answer to a single request
    pub response_timeout: Duration,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self::from(&ShopConfig::default())
    }
}

impl From<&ShopConfig> for ShopSettings {
    fn from(config: &ShopConfig) -> Self {
        Self {
            search_debounce: config.search_debounce,
            checkout_timeout: config.checkout_timeout,
            // Leave room for the HTTP client's own timeout to fire first
            response_timeout: config.request_timeout + Duration::from_secs(5),
        }
    }
}

/// One shopping session
///
/// Owns the shop state for its lifetime. Dropping the app cancels a pending
/// debounced search.
pub struct ShopApp {
    store: ShopStore,
    debouncer: Debouncer,
    settings: ShopSettings,
    has_fallback: bool,
    /// Serializes checkouts started through this app
    checkout_gate: Mutex<()>,
}

impl ShopApp {
    /// Session over an explicit environment
    #[must_use]
    pub fn new(environment: ShopEnvironment, settings: ShopSettings) -> Self {
        let has_fallback = environment.fallback_catalog.is_some();
        Self {
            store: Store::new(ShopState::default(), ShopReducer::new(), environment),
            debouncer: Debouncer::new(settings.search_debounce),
            settings,
            has_fallback,
            checkout_gate: Mutex::new(()),
        }
    }

    /// Session talking HTTP to `config.api_root`
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Client`] if the API root is unusable.
    pub fn connect(config: &ShopConfig) -> Result<Self, ShopError> {
        let client = CatalogClient::with_timeout(&config.api_root, config.request_timeout)?;
        let mut environment = ShopEnvironment::new(Arc::new(client), Arc::new(SystemClock));
        if config.fallback_catalog {
            environment = environment.with_fallback_catalog(demo_catalog());
        }
        tracing::info!(
            api_root = %config.api_root,
            fallback = config.fallback_catalog,
            "Shop session created"
        );
        Ok(Self::new(environment, ShopSettings::from(config)))
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &ShopStore {
        &self.store
    }

    /// Notifications and effect results as they are reduced
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShopAction> {
        self.store.subscribe_actions()
    }

    /// Replace the catalog with the remote one
    ///
    /// Returns the number of lessons now in the catalog. When the fetch fails
    /// and a fallback catalog is configured, the fallback is loaded and this
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Api`] if the fetch failed without a fallback, or
    /// [`ShopError::Store`] if no answer arrived in time.
    #[tracing::instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<usize, ShopError> {
        let outcome = self
            .store
            .send_and_wait_for(
                ShopAction::LoadCatalog,
                |action| {
                    matches!(
                        action,
                        ShopAction::CatalogLoaded { .. } | ShopAction::CatalogLoadFailed { .. }
                    )
                },
                self.settings.response_timeout,
            )
            .await?;

        if let ShopAction::CatalogLoadFailed { error } = outcome {
            if !self.has_fallback {
                return Err(error.into());
            }
        }
        Ok(self.store.state(|s| s.ledger.len()).await)
    }

    /// Select a lesson
    ///
    /// Returns the lesson's remaining spaces.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Cart`] when the lesson is unknown, full, already
    /// selected, or a checkout is running.
    #[tracing::instrument(skip(self, lesson_id), fields(lesson_id = %lesson_id))]
    pub async fn add_to_cart(&self, lesson_id: &LessonId) -> Result<u32, ShopError> {
        let action = ShopAction::AddToCart {
            lesson_id: lesson_id.clone(),
        };
        let spaces = self.cart_request(action, lesson_id).await?;
        Ok(spaces.unwrap_or_default())
    }

    /// Deselect a lesson
    ///
    /// Returns the lesson's remaining spaces, or `None` if the catalog no
    /// longer lists it.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Cart`] when the lesson is not in the cart or a
    /// checkout is running.
    #[tracing::instrument(skip(self, lesson_id), fields(lesson_id = %lesson_id))]
    pub async fn remove_from_cart(&self, lesson_id: &LessonId) -> Result<Option<u32>, ShopError> {
        let action = ShopAction::RemoveFromCart {
            lesson_id: lesson_id.clone(),
        };
        self.cart_request(action, lesson_id).await
    }

    async fn cart_request(
        &self,
        action: ShopAction,
        lesson_id: &LessonId,
    ) -> Result<Option<u32>, ShopError> {
        let outcome = self
            .store
            .send_and_wait_for(
                action,
                |action| match action {
                    ShopAction::CartUpdated { lesson_id: id, .. }
                    | ShopAction::CartRejected { lesson_id: id, .. } => id == lesson_id,
                    _ => false,
                },
                self.settings.response_timeout,
            )
            .await?;

        match outcome {
            ShopAction::CartRejected { error, .. } => {
                metrics::counter!(CART_REJECTED).increment(1);
                Err(error.into())
            },
            ShopAction::CartUpdated { spaces, .. } => Ok(spaces),
            _ => Err(StoreError::ChannelClosed.into()),
        }
    }

    /// Change the catalog view ordering
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if the store is shutting down.
    pub async fn set_sort(&self, criterion: SortCriterion) -> Result<(), ShopError> {
        self.store.send(ShopAction::SetSort { criterion }).await?;
        Ok(())
    }

    /// Search text changed
    ///
    /// The query is sent once the text has been stable for the debounce
    /// window; a blank query reloads the full catalog. Results arrive
    /// asynchronously and replace the catalog.
    pub fn search_text_changed(&self, text: impl Into<String>) {
        let query = text.into();
        let store = self.store.clone();
        self.debouncer.schedule(async move {
            if let Err(error) = store.send(ShopAction::Search { query }).await {
                tracing::warn!(%error, "Debounced search dropped");
            }
        });
    }

    /// Place an order for the whole cart
    ///
    /// Runs the full checkout: validation, order submission, one capacity
    /// update per lesson, then cart clear and catalog reload. Only the outcome
    /// of this call's own attempt is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Checkout`] with the reason the checkout did not
    /// complete. Capacity updates that fail after the order is accepted do not
    /// fail the checkout; they are listed in the receipt. If no outcome arrives
    /// within the configured timeout this returns
    /// [`CheckoutError::Interrupted`] while the checkout keeps running, so a
    /// late acceptance still clears the cart and reloads the catalog.
    #[tracing::instrument(skip(self, name, phone))]
    pub async fn checkout(
        &self,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<CheckoutReceipt, ShopError> {
        let Ok(_gate) = self.checkout_gate.try_lock() else {
            return Err(CheckoutError::AlreadyInProgress.into());
        };

        // Subscribe before sending so an immediate outcome is not missed
        let mut outcomes = self.store.subscribe_actions();
        self.store
            .send(ShopAction::Checkout {
                name: name.into(),
                phone: phone.into(),
            })
            .await?;
        let attempt = self.store.state(|s| s.checkout_attempts).await;
        tracing::debug!(attempt, "Checkout sent");

        let waited = tokio::time::timeout(
            self.settings.checkout_timeout,
            Self::outcome_of(&mut outcomes, attempt),
        )
        .await;

        let result = match waited {
            Ok(outcome) => outcome?,
            Err(_) => self.late_outcome(attempt).await,
        };

        match result {
            Ok(receipt) => {
                metrics::counter!(CHECKOUT_COMPLETED).increment(1);
                metrics::counter!(CHECKOUT_SYNC_FAILURES)
                    .increment(u64::try_from(receipt.sync_failures.len()).unwrap_or(u64::MAX));
                Ok(receipt)
            },
            Err(error) => {
                if !matches!(error, CheckoutError::Interrupted(_)) {
                    metrics::counter!(CHECKOUT_FAILED).increment(1);
                }
                Err(error.into())
            },
        }
    }

    /// Wait for the notification that ends checkout `attempt`
    async fn outcome_of(
        outcomes: &mut broadcast::Receiver<ShopAction>,
        attempt: u64,
    ) -> Result<Result<CheckoutReceipt, CheckoutError>, StoreError> {
        loop {
            match outcomes.recv().await {
                Ok(ShopAction::CheckoutSucceeded { attempt: done, receipt }) if done == attempt => {
                    return Ok(Ok(receipt));
                },
                Ok(ShopAction::CheckoutFailed { attempt: done, error }) if done == attempt => {
                    return Ok(Err(error));
                },
                Ok(_) => {},
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, attempt, "Checkout observer lagged");
                },
                Err(broadcast::error::RecvError::Closed) => return Err(StoreError::ChannelClosed),
            }
        }
    }

    /// Outcome of `attempt` once the wait has expired
    ///
    /// The checkout is left running. A success that landed while the
    /// notification was missed is still returned.
    async fn late_outcome(&self, attempt: u64) -> Result<CheckoutReceipt, CheckoutError> {
        match self.checkout_phase().await {
            CheckoutPhase::Succeeded(receipt) if receipt.attempt == attempt => Ok(receipt),
            phase => {
                let reason = format!(
                    "no outcome within {}s",
                    self.settings.checkout_timeout.as_secs_f32()
                );
                tracing::warn!(attempt, phase = phase.name(), %reason, "Checkout still running");
                Err(CheckoutError::Interrupted(reason))
            },
        }
    }

    /// Catalog sorted by the current criterion
    pub async fn catalog_view(&self) -> Vec<Lesson> {
        self.store.state(ShopState::catalog_view).await
    }

    /// Cart entries in selection order
    pub async fn cart(&self) -> Vec<CartEntry> {
        self.store.state(|s| s.cart.entries().to_vec()).await
    }

    /// Sum of cart entry prices
    pub async fn cart_total(&self) -> Money {
        self.store.state(ShopState::cart_total).await
    }

    /// Current or last checkout
    pub async fn checkout_phase(&self) -> CheckoutPhase {
        self.store.state(|s| s.checkout.clone()).await
    }

    /// Current catalog ordering
    pub async fn sort(&self) -> SortCriterion {
        self.store.state(|s| s.sort).await
    }

    /// Search text of the last search sent, as typed
    pub async fn search_text(&self) -> String {
        self.store.state(|s| s.query.clone()).await
    }

    /// Stop accepting actions and wait for running effects
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if effects are still running at `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ShopError> {
        self.debouncer.cancel();
        self.store.shutdown(timeout).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ShopApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopApp")
            .field("settings", &self.settings)
            .field("has_fallback", &self.has_fallback)
            .finish_non_exhaustive()
    }
}
