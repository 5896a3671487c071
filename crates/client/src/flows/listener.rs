//! Reaction to new session tokens.
//!
//! The listener follows the store's token. Every time a token different from
//! the last one seen appears, it fetches the cart details for it. It runs as
//! its own task: the code that dispatched the token does not wait for the
//! fetch, and a flow that needs the cart fetches it explicitly. Both write
//! the same server snapshot, so whichever finishes last wins with equal data.
//!
//! Ordering: the listener only sees a token after the dispatch that set it
//! has returned. Fetches run one at a time in token order.

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use shopfront_core::SessionToken;

use crate::services::CartService;
use crate::store::Store;

/// Handle to the token-following task. Dropping it stops the task.
#[derive(Debug)]
pub struct TokenListener {
    handle: JoinHandle<()>,
}

impl TokenListener {
    /// Start following `store`'s token. The current token, if any, counts as
    /// newly appeared.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn spawn(store: &Store, carts: CartService) -> Self {
        let mut updates = store.subscribe();

        let task = async move {
            let mut last_seen: Option<SessionToken> = None;
            loop {
                let token = updates.borrow_and_update().jwt.clone();
                if token != last_seen {
                    if let Some(token) = &token {
                        debug!("New session token, fetching cart details");
                        if let Err(e) = carts.fetch_cart_details(token).await {
                            warn!(error = %e, "Cart details fetch after token change failed");
                        }
                    }
                    last_seen = token;
                }

                if updates.changed().await.is_err() {
                    debug!("Store dropped, token listener exiting");
                    break;
                }
            }
        };

        Self {
            handle: tokio::spawn(task.instrument(info_span!("token_listener"))),
        }
    }

    /// Whether the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop following the token.
    pub fn shutdown(self) {
        // Drop aborts the task.
    }
}

impl Drop for TokenListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::api::Endpoint;
    use crate::api::fake::FakeApi;
    use crate::cache::{CartCache, MemoryStorage};
    use crate::store::Action;

    fn setup(api: FakeApi) -> (Arc<FakeApi>, Arc<Store>, CartService) {
        let api = Arc::new(api);
        let store = Arc::new(Store::new());
        let cache = CartCache::new(Arc::new(MemoryStorage::new()));
        let carts = CartService::new(api.clone(), store.clone(), cache);
        (api, store, carts)
    }

    async fn wait_for_cart(store: &Store) {
        let mut updates = store.subscribe();
        tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|state| state.cart_details.is_some()),
        )
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test]
    async fn test_new_token_triggers_cart_fetch() {
        let (api, store, carts) = setup(FakeApi::new().with_open_cart(0));
        let _listener = TokenListener::spawn(&store, carts);

        store.dispatch(Action::SetJwt(FakeApi::token()));
        wait_for_cart(&store).await;

        assert_eq!(api.calls(), [Endpoint::CurrentCart]);
        assert_eq!(store.select(|s| s.cart_details.clone()), api.cart());
    }

    #[tokio::test]
    async fn test_existing_token_is_handled_on_start() {
        let (api, store, carts) = setup(FakeApi::new().with_open_cart(0));
        store.dispatch(Action::SetJwt(FakeApi::token()));

        let _listener = TokenListener::spawn(&store, carts);
        wait_for_cart(&store).await;

        assert_eq!(api.calls(), [Endpoint::CurrentCart]);
    }

    #[tokio::test]
    async fn test_unrelated_dispatches_do_not_refetch() {
        let (api, store, carts) = setup(FakeApi::new().with_open_cart(0));
        let _listener = TokenListener::spawn(&store, carts);
        store.dispatch(Action::SetJwt(FakeApi::token()));
        wait_for_cart(&store).await;

        store.dispatch(Action::SetCities(vec!["Haifa".to_string()]));
        store.dispatch(Action::SetJwt(FakeApi::token()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(api.calls(), [Endpoint::CurrentCart]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let (api, store, carts) = setup(FakeApi::new());
        let listener = TokenListener::spawn(&store, carts);
        listener.shutdown();

        store.dispatch(Action::SetJwt(FakeApi::token()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(api.calls().is_empty());
    }
}
