//! End-to-end tests for the shop facade over `MockCatalogApi`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use lesson_cart_core::environment::Clock;
use lesson_cart_core::{
    ApiError, CartError, CheckoutError, CheckoutPhase, LessonId, Money, ShopAction,
    ShopEnvironment, SortCriterion, SortField,
};
use lesson_cart_testing::{
    ApiCall, MockCatalogApi, init_test_tracing, lesson, sample_catalog, test_clock,
};
use lesson_shop::{ShopApp, ShopError, ShopSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn settings() -> ShopSettings {
    ShopSettings {
        search_debounce: Duration::from_millis(300),
        checkout_timeout: Duration::from_secs(1),
        response_timeout: Duration::from_secs(5),
    }
}

fn app_over(api: &Arc<MockCatalogApi>) -> ShopApp {
    init_test_tracing();
    let environment = ShopEnvironment::new(Arc::<MockCatalogApi>::clone(api), Arc::new(test_clock()));
    ShopApp::new(environment, settings())
}

async fn loaded_app(api: &Arc<MockCatalogApi>) -> ShopApp {
    let app = app_over(api);
    assert_eq!(app.load_catalog().await.unwrap(), 5);
    app
}

async fn next_matching<F>(rx: &mut broadcast::Receiver<ShopAction>, predicate: F) -> ShopAction
where
    F: Fn(&ShopAction) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let action = rx.recv().await.unwrap();
            if predicate(&action) {
                return action;
            }
        }
    })
    .await
    .expect("no matching action")
}

fn id(raw: &str) -> LessonId {
    LessonId::new(raw)
}

#[tokio::test]
async fn test_checkout_end_to_end() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let app = loaded_app(&api).await;

    assert_eq!(app.add_to_cart(&id("1")).await.unwrap(), 1);
    assert_eq!(app.add_to_cart(&id("3")).await.unwrap(), 4);
    assert_eq!(app.cart_total().await.to_string(), "£165.00");

    let receipt = app.checkout("Ada Lovelace", "07123456789").await.unwrap();

    assert_eq!(receipt.customer_name, "Ada Lovelace");
    assert_eq!(receipt.lesson_count, 2);
    assert_eq!(receipt.placed_at, test_clock().now());
    assert!(receipt.fully_synced());
    assert!(app.cart().await.is_empty());
    assert!(matches!(app.checkout_phase().await, CheckoutPhase::Succeeded(_)));
    assert_eq!(api.space_updates(), [(id("1"), 1), (id("3"), 4)]);

    // The view now comes from the reloaded remote catalog
    let art = app
        .catalog_view()
        .await
        .into_iter()
        .find(|lesson| lesson.id == id("1"))
        .unwrap();
    assert_eq!(art.spaces, 1);
    assert_eq!(api.calls().last(), Some(&ApiCall::FetchLessons));
}

#[tokio::test]
async fn test_cart_refusals_are_typed() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let app = loaded_app(&api).await;
    app.add_to_cart(&id("5")).await.unwrap();

    let cases = [
        ("5", CartError::AlreadyInCart(id("5"))),
        ("4", CartError::NoCapacity(id("4"))),
        ("42", CartError::NotFound(id("42"))),
    ];
    for (raw, expected) in cases {
        match app.add_to_cart(&id(raw)).await {
            Err(ShopError::Cart(error)) => assert_eq!(error, expected),
            other => panic!("lesson {raw}: expected {expected:?}, got {other:?}"),
        }
    }

    assert!(matches!(
        app.remove_from_cart(&id("2")).await,
        Err(ShopError::Cart(CartError::NotFound(_)))
    ));
    assert_eq!(app.cart().await.len(), 1);
}

#[tokio::test]
async fn test_remove_restores_spaces() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let app = loaded_app(&api).await;

    assert_eq!(app.add_to_cart(&id("5")).await.unwrap(), 0);
    assert_eq!(app.remove_from_cart(&id("5")).await.unwrap(), Some(1));
    assert!(app.cart().await.is_empty());
}

#[tokio::test]
async fn test_sort_changes_view_only() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let app = loaded_app(&api).await;

    app.set_sort(SortCriterion::descending(SortField::Price))
        .await
        .unwrap();
    let ids: Vec<_> = app
        .catalog_view()
        .await
        .into_iter()
        .map(|lesson| lesson.id)
        .collect();

    // 3 and 5 tie at £90 and keep catalog order
    assert_eq!(ids, [id("4"), id("2"), id("3"), id("5"), id("1")]);
    assert_eq!(app.sort().await, SortCriterion::descending(SortField::Price));
}

#[tokio::test]
async fn test_invalid_details_send_nothing() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let app = loaded_app(&api).await;
    app.add_to_cart(&id("2")).await.unwrap();

    let error = app.checkout("R2D2", "07123456789").await.unwrap_err();
    assert!(matches!(
        error,
        ShopError::Checkout(CheckoutError::InvalidInput(_))
    ));
    assert!(api.orders().is_empty());
    assert_eq!(app.cart().await.len(), 1);
}

#[tokio::test]
async fn test_load_failure_without_fallback_is_an_error() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()).failing_fetch());
    let app = app_over(&api);

    let error = app.load_catalog().await.unwrap_err();
    assert!(matches!(error, ShopError::Api(ApiError::Transport(_))));
    assert!(app.catalog_view().await.is_empty());
}

#[tokio::test]
async fn test_load_failure_uses_fallback_catalog() {
    let api = Arc::new(MockCatalogApi::new(Vec::new()).failing_fetch());
    let fallback = vec![
        lesson("a", "Drama", "Leeds", 60, 3),
        lesson("b", "Dance", "Leeds", 65, 2),
    ];
    let environment = ShopEnvironment::new(Arc::<MockCatalogApi>::clone(&api), Arc::new(test_clock()))
        .with_fallback_catalog(fallback);
    let app = ShopApp::new(environment, settings());

    assert_eq!(app.load_catalog().await.unwrap(), 2);
    assert_eq!(app.add_to_cart(&id("b")).await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_search_sends_last_text_only() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let app = loaded_app(&api).await;
    let mut rx = app.subscribe();

    app.search_text_changed("l");
    tokio::time::sleep(Duration::from_millis(100)).await;
    app.search_text_changed("lon");
    tokio::time::sleep(Duration::from_millis(100)).await;
    app.search_text_changed("london");

    let results = next_matching(&mut rx, |action| {
        matches!(action, ShopAction::SearchResults { .. })
    })
    .await;

    let ShopAction::SearchResults { query, lessons } = results else {
        unreachable!()
    };
    assert_eq!(query, "london");
    assert_eq!(lessons.len(), 2);
    let searches: Vec<_> = api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, ApiCall::SearchLessons { .. }))
        .collect();
    assert_eq!(
        searches,
        [ApiCall::SearchLessons {
            query: "london".to_string()
        }]
    );
    assert_eq!(app.catalog_view().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_blank_search_text_reloads_catalog() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let app = loaded_app(&api).await;
    let mut rx = app.subscribe();

    app.search_text_changed("art");
    next_matching(&mut rx, |action| matches!(action, ShopAction::SearchResults { .. })).await;
    assert_eq!(app.catalog_view().await.len(), 1);

    app.search_text_changed("  ");
    next_matching(&mut rx, |action| matches!(action, ShopAction::CatalogLoaded { .. })).await;
    assert_eq!(app.catalog_view().await.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_slow_checkout_is_interrupted_but_completes() {
    let api = Arc::new(
        MockCatalogApi::new(sample_catalog()).with_order_delay(Duration::from_secs(3)),
    );
    let app = loaded_app(&api).await;
    app.add_to_cart(&id("2")).await.unwrap();

    let error = app.checkout("Ada Lovelace", "07123456789").await.unwrap_err();

    assert!(matches!(
        error,
        ShopError::Checkout(CheckoutError::Interrupted(_))
    ));
    assert!(app.checkout_phase().await.is_in_flight());
    assert!(matches!(
        app.checkout("Grace Hopper", "0200000000").await,
        Err(ShopError::Checkout(CheckoutError::AlreadyInProgress))
    ));

    // The order was accepted late: capacity is synced, the cart cleared and the catalog reloaded
    tokio::time::sleep(Duration::from_secs(10)).await;
    let receipt = app.checkout_phase().await.receipt().cloned().expect("checkout succeeded");
    assert_eq!(receipt.attempt, 1);
    assert_eq!(receipt.customer_name, "Ada Lovelace");
    assert!(app.cart().await.is_empty());
    assert_eq!(api.orders().len(), 1);
    assert_eq!(api.space_updates(), [(id("2"), 3)]);
    assert_eq!(api.calls().last(), Some(&ApiCall::FetchLessons));
}

#[tokio::test(start_paused = true)]
async fn test_checkout_returns_its_own_receipt() {
    // The reload after each checkout outlasts the wait, so every success
    // notification lands after the next checkout has started
    let api = Arc::new(
        MockCatalogApi::new(sample_catalog()).with_fetch_delay(Duration::from_millis(1200)),
    );
    let app = loaded_app(&api).await;
    let mut rx = app.subscribe();

    app.add_to_cart(&id("1")).await.unwrap();
    let first = app.checkout("Ada Lovelace", "07123456789").await.unwrap();
    assert_eq!(first.attempt, 1);
    assert_eq!(first.customer_name, "Ada Lovelace");

    app.add_to_cart(&id("3")).await.unwrap();
    let second = app.checkout("Grace Hopper", "0200000000").await.unwrap();
    assert_eq!(second.attempt, 2);
    assert_eq!(second.customer_name, "Grace Hopper");
    assert_eq!(second.total, Money::from_pounds(90));

    let stale = next_matching(&mut rx, |action| {
        matches!(action, ShopAction::CheckoutSucceeded { .. })
    })
    .await;
    assert!(matches!(stale, ShopAction::CheckoutSucceeded { attempt: 1, .. }));
    assert_eq!(api.orders().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_falls_back_to_full_catalog() {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()).failing_search());
    let app = loaded_app(&api).await;
    let mut rx = app.subscribe();

    app.search_text_changed("london");
    next_matching(&mut rx, |action| matches!(action, ShopAction::SearchFailed { .. })).await;
    next_matching(&mut rx, |action| matches!(action, ShopAction::CatalogLoaded { .. })).await;

    assert_eq!(app.search_text().await, "london");
    assert_eq!(app.catalog_view().await.len(), 5);
    assert_eq!(api.calls().last(), Some(&ApiCall::FetchLessons));
}

#[tokio::test(start_paused = true)]
async fn test_second_checkout_is_refused_while_first_runs() {
    let api = Arc::new(
        MockCatalogApi::new(sample_catalog()).with_order_delay(Duration::from_millis(500)),
    );
    let app = Arc::new(loaded_app(&api).await);
    app.add_to_cart(&id("3")).await.unwrap();

    let first = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.checkout("Ada Lovelace", "07123456789").await }
    });
    while !app.checkout_phase().await.is_in_flight() {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        app.checkout("Grace Hopper", "0200000000").await,
        Err(ShopError::Checkout(CheckoutError::AlreadyInProgress))
    ));
    assert!(matches!(
        app.add_to_cart(&id("2")).await,
        Err(ShopError::Cart(CartError::CheckoutInProgress))
    ));

    let receipt = first.await.unwrap().unwrap();
    assert_eq!(receipt.customer_name, "Ada Lovelace");
    assert_eq!(api.orders().len(), 1);
}
