//! Integration tests driving the shop reducer through the Store
//!
//! Effects really run here: remote calls go to `MockCatalogApi`, and their
//! results are fed back and broadcast by the Store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use lesson_cart_core::{
    CheckoutError, CheckoutPhase, LessonId, ShopAction, ShopEnvironment, ShopReducer, ShopState,
};
use lesson_cart_runtime::{Store, StoreError};
use lesson_cart_testing::{ApiCall, MockCatalogApi, sample_catalog, test_clock};
use std::sync::Arc;
use std::time::Duration;

type ShopStore = Store<ShopState, ShopAction, ShopEnvironment, ShopReducer>;

fn shop(api: &Arc<MockCatalogApi>) -> ShopStore {
    let env = ShopEnvironment::new(Arc::<MockCatalogApi>::clone(api), Arc::new(test_clock()));
    Store::new(ShopState::default(), ShopReducer, env)
}

async fn loaded_shop(api: &Arc<MockCatalogApi>) -> ShopStore {
    let store = shop(api);
    let mut handle = store.send(ShopAction::LoadCatalog).await.unwrap();
    handle.wait().await;
    store
}

fn is_checkout_outcome(action: &ShopAction) -> bool {
    matches!(
        action,
        ShopAction::CheckoutSucceeded { .. } | ShopAction::CheckoutFailed { .. }
    )
}

fn checkout() -> ShopAction {
    ShopAction::Checkout {
        name: "Grace Hopper".to_string(),
        phone: "0200000000".to_string(),
    }
}

#[tokio::test]
async fn test_whole_checkout_settles_under_one_handle() -> Result<(), StoreError> {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let store = loaded_shop(&api).await;
    store.send(ShopAction::AddToCart { lesson_id: LessonId::new("1") }).await?;
    store.send(ShopAction::AddToCart { lesson_id: LessonId::new("2") }).await?;

    let mut handle = store.send(checkout()).await?;
    handle.wait_with_timeout(Duration::from_secs(5)).await?;

    let (phase, cart_len, spaces) = store
        .state(|s| {
            (
                s.checkout.clone(),
                s.cart.len(),
                s.ledger.spaces(&LessonId::new("1")),
            )
        })
        .await;
    assert!(matches!(phase, CheckoutPhase::Succeeded(_)));
    assert_eq!(cart_len, 0);
    // Reloaded from the remote store, which received the decrement
    assert_eq!(spaces, Some(1));

    let calls = api.calls();
    assert_eq!(calls.first(), Some(&ApiCall::FetchLessons));
    assert!(matches!(calls[1], ApiCall::SubmitOrder { .. }));
    assert_eq!(
        calls[2..],
        [
            ApiCall::UpdateSpaces { lesson_id: LessonId::new("1"), spaces: 1 },
            ApiCall::UpdateSpaces { lesson_id: LessonId::new("2"), spaces: 3 },
            ApiCall::FetchLessons,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_success_notification_sees_reloaded_catalog() -> Result<(), StoreError> {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()));
    let store = loaded_shop(&api).await;
    store.send(ShopAction::AddToCart { lesson_id: LessonId::new("5") }).await?;

    let outcome = store
        .send_and_wait_for(checkout(), is_checkout_outcome, Duration::from_secs(5))
        .await?;

    let ShopAction::CheckoutSucceeded { attempt, receipt } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(attempt, 1);
    assert_eq!(receipt.attempt, 1);
    assert_eq!(receipt.lesson_count, 1);
    let spaces = store.state(|s| s.ledger.spaces(&LessonId::new("5"))).await;
    assert_eq!(spaces, Some(0));
    Ok(())
}

#[tokio::test]
async fn test_failed_order_is_observed() -> Result<(), StoreError> {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()).failing_orders());
    let store = loaded_shop(&api).await;
    store.send(ShopAction::AddToCart { lesson_id: LessonId::new("3") }).await?;

    let outcome = store
        .send_and_wait_for(checkout(), is_checkout_outcome, Duration::from_secs(5))
        .await?;

    assert!(matches!(
        outcome,
        ShopAction::CheckoutFailed { attempt: 1, error: CheckoutError::OrderSubmission(_) }
    ));
    let (cart_len, spaces) = store
        .state(|s| (s.cart.len(), s.ledger.spaces(&LessonId::new("3"))))
        .await;
    assert_eq!(cart_len, 1);
    assert_eq!(spaces, Some(4));
    assert!(api.space_updates().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_middle_update_does_not_stop_the_rest() -> Result<(), StoreError> {
    let api = Arc::new(MockCatalogApi::new(sample_catalog()).failing_update("2"));
    let store = loaded_shop(&api).await;
    for raw in ["1", "2", "3"] {
        store.send(ShopAction::AddToCart { lesson_id: LessonId::new(raw) }).await?;
    }

    let mut handle = store.send(checkout()).await?;
    handle.wait_with_timeout(Duration::from_secs(5)).await?;

    let (phase, cart_empty) = store.state(|s| (s.checkout.clone(), s.cart.is_empty())).await;
    let CheckoutPhase::Succeeded(receipt) = phase else {
        panic!("expected success, got {phase:?}");
    };
    assert!(cart_empty);
    assert_eq!(receipt.lesson_count, 3);
    assert_eq!(receipt.sync_failures.len(), 1);
    assert_eq!(receipt.sync_failures[0].lesson_id, LessonId::new("2"));

    let updates: Vec<ApiCall> = api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, ApiCall::UpdateSpaces { .. }))
        .collect();
    assert_eq!(
        updates,
        [
            ApiCall::UpdateSpaces { lesson_id: LessonId::new("1"), spaces: 1 },
            ApiCall::UpdateSpaces { lesson_id: LessonId::new("2"), spaces: 3 },
            ApiCall::UpdateSpaces { lesson_id: LessonId::new("3"), spaces: 4 },
        ]
    );
    assert_eq!(api.calls().last(), Some(&ApiCall::FetchLessons));
    Ok(())
}
