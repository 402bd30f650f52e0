//! # Lesson Cart Core
//!
//! Domain types and business logic for the lesson shop client.
//!
//! The shop keeps a local view of a remote lesson catalog, lets a customer
//! select lessons into a cart while keeping remaining capacity consistent,
//! and runs a two-phase checkout against the remote store.
//!
//! ## Core Concepts
//!
//! - **Capacity Ledger**: remaining `spaces` per lesson ([`ledger::CapacityLedger`])
//! - **Cart**: snapshot entries, one per lesson ([`cart::Cart`])
//! - **Catalog View**: stable sorted projection of the ledger ([`catalog::project`])
//! - **Validation**: customer name/phone predicates ([`validation`])
//! - **Checkout**: order submission followed by serialized capacity sync ([`checkout`])
//! - **Shop reducer**: everything above as one `Reducer` ([`shop::ShopReducer`])
//!
//! Remote calls never happen inside the reducer. The reducer returns
//! [`effect::Effect`] descriptions which a store runtime executes, feeding
//! the resulting actions back in.
//!
//! ## Example
//!
//! ```ignore
//! let mut state = ShopState::default();
//! let effects = ShopReducer.reduce(
//!     &mut state,
//!     ShopAction::AddToCart { lesson_id: LessonId::new("1") },
//!     &env,
//! );
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod effect_macros;
pub mod error;
pub mod ledger;
pub mod shop;
pub mod types;
pub mod validation;

/// Reducer module - the trait all business logic implements
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
pub mod reducer {
    use super::effect::Effect;

    /// The Reducer trait
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns the effects to be executed by
        /// the runtime. Must not perform I/O itself.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Vec<Effect<Self::Action>>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values, not execution. The store runtime decides when and
/// where they run.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects one after another, each finishing before the next starts
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Whether this effect does nothing when executed
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Sequential(effects) => effects.iter().all(Effect::is_none),
                Effect::Future(_) => false,
            }
        }
    }
}

/// Environment module - dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected via
/// the reducer's environment, so tests can swap in deterministic mocks.
pub mod environment {
    use crate::error::ApiError;
    use crate::types::{Lesson, LessonId, OrderRequest};
    use chrono::{DateTime, Utc};
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future returned by [`CatalogApi`] methods
    ///
    /// Returned instead of `async fn` so the trait stays dyn-compatible.
    pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// The remote catalog and order store
    ///
    /// Every method is a single request; none of them retries.
    pub trait CatalogApi: Send + Sync {
        /// Fetch the full catalog (`GET /lessons`).
        ///
        /// # Errors
        ///
        /// Returns [`ApiError`] on transport failure, non-success status or an
        /// undecodable body.
        fn fetch_lessons(&self) -> ApiFuture<'_, Vec<Lesson>>;

        /// Free-text search over subject and location (`GET /search?q=`).
        ///
        /// # Errors
        ///
        /// Same as [`CatalogApi::fetch_lessons`].
        fn search_lessons<'a>(&'a self, query: &'a str) -> ApiFuture<'a, Vec<Lesson>>;

        /// Record an order (`POST /orders`). Only the status matters.
        ///
        /// # Errors
        ///
        /// Returns [`ApiError`] on transport failure or non-success status.
        fn submit_order<'a>(&'a self, order: &'a OrderRequest) -> ApiFuture<'a, ()>;

        /// Overwrite one lesson's remaining capacity (`PUT /lessons/{id}`).
        ///
        /// # Errors
        ///
        /// Returns [`ApiError`] on transport failure or non-success status.
        fn update_spaces<'a>(&'a self, lesson_id: &'a LessonId, spaces: u32) -> ApiFuture<'a, ()>;
    }
}

// Re-export commonly used types
pub use cart::Cart;
pub use catalog::project;
pub use checkout::{CheckoutPhase, CheckoutReceipt, SyncFailure};
pub use error::{ApiError, CartError, CheckoutError, LedgerError, ValidationError};
pub use ledger::CapacityLedger;
pub use shop::{ShopAction, ShopEnvironment, ShopReducer, ShopState};
pub use types::{CartEntry, Lesson, LessonId, Money, OrderRequest, SortCriterion, SortField, SortOrder};
pub use validation::{CustomerDetails, validate_name, validate_phone};
