//! # Lesson Cart Testing
//!
//! Testing utilities for the lesson shop.
//!
//! This crate provides:
//! - A deterministic clock
//! - An in-memory `CatalogApi` that records every call
//! - Lesson fixtures and proptest strategies
//! - A Given-When-Then helper for reducers
//!
//! ## Example
//!
//! ```ignore
//! use lesson_cart_testing::{MockCatalogApi, sample_catalog, test_clock};
//!
//! #[tokio::test]
//! async fn test_checkout_flow() {
//!     let api = Arc::new(MockCatalogApi::new(sample_catalog()));
//!     let env = ShopEnvironment::new(api.clone(), Arc::new(test_clock()));
//!     let store = Store::new(ShopState::default(), ShopReducer, env);
//!     // ...
//!     assert_eq!(api.orders().len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use lesson_cart_core::environment::Clock;


pub use reducer_test::{ReducerTest, collect_actions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use lesson_cart_core::environment::{ApiFuture, CatalogApi};
    use lesson_cart_core::{ApiError, Lesson, LessonId, OrderRequest};
    use std::collections::HashSet;
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use lesson_cart_testing::mocks::FixedClock;
    /// use lesson_cart_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// One recorded call against [`MockCatalogApi`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ApiCall {
        /// `GET /lessons`
        FetchLessons,
        /// `GET /search?q=`
        SearchLessons {
            /// Query as sent
            query: String,
        },
        /// `POST /orders`
        SubmitOrder {
            /// Order as sent
            order: OrderRequest,
        },
        /// `PUT /lessons/{id}`
        UpdateSpaces {
            /// Lesson updated
            lesson_id: LessonId,
            /// Spaces sent
            spaces: u32,
        },
    }

    #[derive(Debug, Default)]
    struct MockState {
        catalog: Vec<Lesson>,
        calls: Vec<ApiCall>,
        fail_fetch: bool,
        fail_search: bool,
        fail_orders: bool,
        failing_updates: HashSet<LessonId>,
    }

    /// In-memory remote catalog and order store
    ///
    /// Behaves like the real backend: searches match subject or location
    /// case-insensitively, and capacity updates overwrite the stored lesson
    /// so a reload sees them. Every call is recorded, including failed ones.
    #[derive(Debug, Default)]
    pub struct MockCatalogApi {
        state: Mutex<MockState>,
        fetch_delay: Option<Duration>,
        order_delay: Option<Duration>,
    }

    fn server_error(message: &str) -> ApiError {
        ApiError::Status {
            status: 500,
            message: message.to_string(),
        }
    }

    impl MockCatalogApi {
        /// Backend holding `catalog`
        #[must_use]
        pub fn new(catalog: Vec<Lesson>) -> Self {
            Self {
                state: Mutex::new(MockState {
                    catalog,
                    ..MockState::default()
                }),
                fetch_delay: None,
                order_delay: None,
            }
        }

        /// Every catalog fetch fails
        #[must_use]
        pub fn failing_fetch(self) -> Self {
            self.set_fetch_failing(true);
            self
        }

        /// Every search fails
        #[must_use]
        pub fn failing_search(self) -> Self {
            self.lock().fail_search = true;
            self
        }

        /// Every order is refused with a 500
        #[must_use]
        pub fn failing_orders(self) -> Self {
            self.lock().fail_orders = true;
            self
        }

        /// Capacity updates for `lesson_id` fail with a 500
        #[must_use]
        pub fn failing_update(self, lesson_id: impl Into<String>) -> Self {
            self.lock().failing_updates.insert(LessonId::new(lesson_id));
            self
        }

        /// Catalog fetches take `delay` to answer
        #[must_use]
        pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
            self.fetch_delay = Some(delay);
            self
        }

        /// Orders take `delay` to answer
        #[must_use]
        pub fn with_order_delay(mut self, delay: Duration) -> Self {
            self.order_delay = Some(delay);
            self
        }

        /// Switch catalog fetch failures on or off
        pub fn set_fetch_failing(&self, failing: bool) {
            self.lock().fail_fetch = failing;
        }

        /// Every call so far, in order
        #[must_use]
        pub fn calls(&self) -> Vec<ApiCall> {
            self.lock().calls.clone()
        }

        /// Orders received so far
        #[must_use]
        pub fn orders(&self) -> Vec<OrderRequest> {
            self.lock()
                .calls
                .iter()
                .filter_map(|call| match call {
                    ApiCall::SubmitOrder { order } => Some(order.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Capacity updates received so far, in order
        #[must_use]
        pub fn space_updates(&self) -> Vec<(LessonId, u32)> {
            self.lock()
                .calls
                .iter()
                .filter_map(|call| match call {
                    ApiCall::UpdateSpaces { lesson_id, spaces } => Some((lesson_id.clone(), *spaces)),
                    _ => None,
                })
                .collect()
        }

        /// Current remote catalog
        #[must_use]
        pub fn catalog(&self) -> Vec<Lesson> {
            self.lock().catalog.clone()
        }

        fn lock(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl CatalogApi for MockCatalogApi {
        fn fetch_lessons(&self) -> ApiFuture<'_, Vec<Lesson>> {
            Box::pin(async move {
                self.lock().calls.push(ApiCall::FetchLessons);
                if let Some(delay) = self.fetch_delay {
                    tokio::time::sleep(delay).await;
                }
                let state = self.lock();
                if state.fail_fetch {
                    return Err(ApiError::Transport("connection refused".to_string()));
                }
                Ok(state.catalog.clone())
            })
        }

        fn search_lessons<'a>(&'a self, query: &'a str) -> ApiFuture<'a, Vec<Lesson>> {
            Box::pin(async move {
                let mut state = self.lock();
                state.calls.push(ApiCall::SearchLessons {
                    query: query.to_string(),
                });
                if state.fail_search {
                    return Err(server_error("search unavailable"));
                }
                let needle = query.to_lowercase();
                Ok(state
                    .catalog
                    .iter()
                    .filter(|lesson| {
                        lesson.subject.to_lowercase().contains(&needle)
                            || lesson.location.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect())
            })
        }

        fn submit_order<'a>(&'a self, order: &'a OrderRequest) -> ApiFuture<'a, ()> {
            Box::pin(async move {
                let failing = {
                    let mut state = self.lock();
                    state.calls.push(ApiCall::SubmitOrder {
                        order: order.clone(),
                    });
                    state.fail_orders
                };
                if let Some(delay) = self.order_delay {
                    tokio::time::sleep(delay).await;
                }
                tracing::debug!(
                    customer = order.customer_name(),
                    total = %order.total(),
                    failing,
                    "Mock order received"
                );
                if failing {
                    return Err(server_error("order store unavailable"));
                }
                Ok(())
            })
        }

        fn update_spaces<'a>(&'a self, lesson_id: &'a LessonId, spaces: u32) -> ApiFuture<'a, ()> {
            Box::pin(async move {
                let mut state = self.lock();
                state.calls.push(ApiCall::UpdateSpaces {
                    lesson_id: lesson_id.clone(),
                    spaces,
                });
                if state.failing_updates.contains(lesson_id) {
                    return Err(server_error("update rejected"));
                }
                match state.catalog.iter_mut().find(|lesson| &lesson.id == lesson_id) {
                    Some(lesson) => {
                        lesson.spaces = spaces;
                        Ok(())
                    },
                    None => Err(ApiError::Status {
                        status: 404,
                        message: "Lesson not found".to_string(),
                    }),
                }
            })
        }
    }
}

/// Lesson fixtures
pub mod fixtures {
    use lesson_cart_core::{Lesson, Money};

    /// A lesson priced in whole pounds
    #[must_use]
    pub fn lesson(id: &str, subject: &str, location: &str, pounds: u64, spaces: u32) -> Lesson {
        Lesson::new(id, subject, location, Money::from_pounds(pounds), spaces)
    }

    /// Small catalog with a nearly full lesson and a full one
    ///
    /// | id | subject | location   | price | spaces |
    /// |----|---------|------------|-------|--------|
    /// | 1  | Art     | Manchester | £75   | 2      |
    /// | 2  | Math    | London     | £100  | 4      |
    /// | 3  | English | London     | £90   | 5      |
    /// | 4  | Science | Oxford     | £120  | 0      |
    /// | 5  | Music   | Bristol    | £90   | 1      |
    #[must_use]
    pub fn sample_catalog() -> Vec<Lesson> {
        vec![
            lesson("1", "Art", "Manchester", 75, 2),
            lesson("2", "Math", "London", 100, 4),
            lesson("3", "English", "London", 90, 5),
            lesson("4", "Science", "Oxford", 120, 0),
            lesson("5", "Music", "Bristol", 90, 1),
        ]
    }
}

/// Test helpers
pub mod helpers {
    /// Route `tracing` output through the test harness
    ///
    /// Safe to call from every test; only the first call installs anything.
    /// Honours `RUST_LOG`.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
///
/// Strategies for domain types, for use with `proptest!`.
pub mod properties {
    use lesson_cart_core::{Lesson, Money};
    use proptest::prelude::*;

    /// A lesson with the given id and arbitrary other fields
    pub fn lesson_with_id(id: String) -> impl Strategy<Value = Lesson> {
        (
            prop::sample::select(vec!["Art", "Math", "English", "Music", "Science"]),
            prop::sample::select(vec!["London", "Bristol", "York", "Oxford", "Manchester"]),
            0u64..20_000,
            0u32..6,
        )
            .prop_map(move |(subject, location, pence, spaces)| {
                Lesson::new(id.clone(), subject, location, Money::from_pence(pence), spaces)
            })
    }

    /// A catalog of 1 to `max` lessons with distinct ids `"0"`, `"1"`, ...
    pub fn catalog(max: usize) -> impl Strategy<Value = Vec<Lesson>> {
        (1..=max.max(1)).prop_flat_map(|len| {
            (0..len)
                .map(|index| lesson_with_id(index.to_string()))
                .collect::<Vec<_>>()
        })
    }
}

// Re-export commonly used items
pub use fixtures::{lesson, sample_catalog};
pub use helpers::init_test_tracing;
pub use mocks::{ApiCall, FixedClock, MockCatalogApi, test_clock};
