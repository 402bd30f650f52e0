//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use lesson_cart_core::async_effect;
///
/// async_effect! {
///     match api.fetch_lessons().await {
///         Ok(lessons) => Some(ShopAction::CatalogLoaded { lessons }),
///         Err(error) => Some(ShopAction::CatalogLoadFailed { error }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` that immediately feeds an action back
///
/// Used for outcome notifications: the store broadcasts every
/// effect-produced action, so observers waiting on a request can see it.
///
/// ```rust,ignore
/// emit!(ShopAction::CartRejected { lesson_id, error })
/// ```
#[macro_export]
macro_rules! emit {
    ($action:expr) => {{
        let action = $action;
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { Some(action) }))
    }};
}
