//! Cart service.
//!
//! Proxies cart and cart-item calls to the backend and mirrors each result
//! into the local cache and the store. The cache is written first and the
//! store only after the write succeeded, so the store never shows a snapshot
//! the cache does not hold. A failed backend call touches neither.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use shopfront_core::{AddCartItem, Cart, CartId, CartItem, CartItemId, ProductId, SessionToken};

use crate::api::StorefrontApi;
use crate::cache::CartCache;
use crate::error::Result;
use crate::store::{Action, Store};

/// Cart lifecycle and cart item operations.
#[derive(Clone)]
pub struct CartService {
    api: Arc<dyn StorefrontApi>,
    store: Arc<Store>,
    cache: CartCache,
}

impl CartService {
    /// Create a cart service over the given backend, store and cache.
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>, store: Arc<Store>, cache: CartCache) -> Self {
        Self { api, store, cache }
    }

    // =========================================================================
    // Cart lifecycle
    // =========================================================================

    /// Fetch the user's current cart.
    ///
    /// When the backend reports no cart, the cart is reset in the store and
    /// the placeholder record is cached so the cache is never left stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the cache write fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart_details(&self, token: &SessionToken) -> Result<Option<Cart>> {
        let Some(cart) = self.api.current_cart(token).await? else {
            self.cache.save_cart(&Cart::placeholder()).await?;
            self.store.dispatch(Action::ResetCartDetails);
            debug!("No current cart");
            return Ok(None);
        };

        self.commit_cart(&cart).await?;
        Ok(Some(cart))
    }

    /// Open a new cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the cache write fails.
    #[instrument(skip(self, token))]
    pub async fn create_cart(&self, token: &SessionToken) -> Result<Cart> {
        let cart = self.api.create_cart(token).await?;
        self.commit_cart(&cart).await?;
        Ok(cart)
    }

    /// Close a cart (checkout) and drop its items from client state.
    ///
    /// The backend's payload is returned unchanged. The cache holds the
    /// cart record with `isOpen` cleared, in the same shape as an open cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or a cache write fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn close_cart(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<serde_json::Value> {
        let response = self.api.close_cart(cart_id, token).await?;

        let closed = self.closed_record(cart_id, &response);
        self.cache.save_cart(&closed).await?;
        self.store.dispatch(Action::CloseCart);

        self.cache.save_items(&[]).await?;
        self.store.dispatch(Action::EmptyCartItems);

        debug!("Cart closed");
        Ok(response)
    }

    // =========================================================================
    // Cart items
    // =========================================================================

    /// Fetch the items of a cart, replacing the cached and stored lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the cache write fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn fetch_cart_items_by_cart_id(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<Vec<CartItem>> {
        let items = self.api.cart_items(cart_id, token).await?;

        self.cache.save_items(&items).await?;
        self.store.dispatch(Action::FetchCartItems(items.clone()));

        debug!(count = items.len(), "Cart items loaded");
        Ok(items)
    }

    /// Add a product to a cart. The created item is appended to the cached
    /// list (started if absent) and to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or a cache access fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id, product = %product))]
    pub async fn add_cart_item(
        &self,
        cart_id: &CartId,
        product: &ProductId,
        quantity: u32,
        token: &SessionToken,
    ) -> Result<CartItem> {
        let body = AddCartItem {
            cart_id: cart_id.clone(),
            product: product.clone(),
            quantity,
        };
        let item = self.api.add_cart_item(&body, token).await?;

        let mut cached = self.cache.load_items().await?.unwrap_or_default();
        cached.push(item.clone());
        self.cache.save_items(&cached).await?;
        self.store.dispatch(Action::AddCartItem(item.clone()));

        debug!(item_id = %item.id, "Cart item added");
        Ok(item)
    }

    /// Delete one cart item.
    ///
    /// A missing cache entry counts as an empty list. If the id is not in
    /// the cached list the list is written back unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or a cache access fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn delete_cart_item(&self, item_id: &CartItemId, token: &SessionToken) -> Result<()> {
        self.api.delete_cart_item(item_id, token).await?;

        let mut cached = self.cache.load_items().await?.unwrap_or_default();
        match cached.iter().position(|item| item.id == *item_id) {
            Some(index) => {
                cached.remove(index);
            }
            None => warn!("Deleted item was not in the cached list"),
        }
        self.cache.save_items(&cached).await?;
        self.store.dispatch(Action::DeleteCartItem(item_id.clone()));

        debug!("Cart item deleted");
        Ok(())
    }

    /// Delete every item of a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the cache write fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn empty_cart_items_by_cart_id(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<()> {
        self.api.empty_cart_items(cart_id, token).await?;

        self.cache.save_items(&[]).await?;
        self.store.dispatch(Action::EmptyCartItems);

        debug!("Cart emptied");
        Ok(())
    }

    // =========================================================================
    // Local state
    // =========================================================================

    /// Load the cached cart and items into the store (warm start).
    ///
    /// A cached placeholder counts as "no cart". Returns the restored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a cache entry cannot be read or is malformed.
    #[instrument(skip(self))]
    pub async fn restore_from_cache(&self) -> Result<Option<Cart>> {
        let cart = self
            .cache
            .load_cart()
            .await?
            .filter(|cart| !cart.is_placeholder());
        let items = self.cache.load_items().await?.unwrap_or_default();

        match &cart {
            Some(cart) => self.store.dispatch(Action::FetchCartDetails(cart.clone())),
            None => self.store.dispatch(Action::ResetCartDetails),
        }
        debug!(
            has_cart = cart.is_some(),
            items = items.len(),
            "Restored cart state from cache"
        );
        self.store.dispatch(Action::FetchCartItems(items));

        Ok(cart)
    }

    /// Drop cart state from the cache and the store.
    ///
    /// # Errors
    ///
    /// Returns an error if a cache entry cannot be removed.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        self.cache.clear().await?;
        self.store.dispatch(Action::ResetCartDetails);
        self.store.dispatch(Action::EmptyCartItems);
        Ok(())
    }

    async fn commit_cart(&self, cart: &Cart) -> Result<()> {
        self.cache.save_cart(cart).await?;
        self.store.dispatch(Action::FetchCartDetails(cart.clone()));
        debug!(cart_id = %cart.id, is_open = cart.is_open, "Cart committed");
        Ok(())
    }

    /// The closed cart record to cache.
    ///
    /// The close endpoint does not reliably answer with a cart, so the known
    /// cart is preferred, then the payload if it parses as one.
    fn closed_record(&self, cart_id: &CartId, response: &serde_json::Value) -> Cart {
        if let Some(known) = self
            .store
            .select(|state| state.cart_details.clone())
            .filter(|cart| cart.id == *cart_id)
        {
            return known.closed();
        }

        serde_json::from_value::<Cart>(response.clone())
            .ok()
            .filter(|cart| cart.id == *cart_id)
            .map_or_else(
                || Cart {
                    id: cart_id.clone(),
                    ..Cart::placeholder()
                },
                |cart| cart.closed(),
            )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::cache::{CART_DETAILS_KEY, LocalStorage, MemoryStorage};
    use crate::api::Endpoint;
    use reqwest::StatusCode;

    struct Harness {
        api: Arc<FakeApi>,
        store: Arc<Store>,
        storage: Arc<MemoryStorage>,
        cache: CartCache,
        carts: CartService,
    }

    fn harness(api: FakeApi) -> Harness {
        let api = Arc::new(api);
        let store = Arc::new(Store::new());
        let storage = Arc::new(MemoryStorage::new());
        let cache = CartCache::new(storage.clone());
        let carts = CartService::new(api.clone(), store.clone(), cache.clone());
        Harness {
            api,
            store,
            storage,
            cache,
            carts,
        }
    }

    #[tokio::test]
    async fn test_fetch_cart_details_mirrors_server_cart() {
        let h = harness(FakeApi::new().with_open_cart(0));
        let token = FakeApi::token();

        let cart = h.carts.fetch_cart_details(&token).await.unwrap();

        assert_eq!(cart, h.api.cart());
        assert_eq!(h.cache.load_cart().await.unwrap(), cart);
        assert_eq!(h.store.select(|s| s.cart_details.clone()), cart);
    }

    #[tokio::test]
    async fn test_cached_cart_is_the_server_document() {
        let server = serde_json::json!({
            "_id": "65a1",
            "userId": "64f1",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "isOpen": 1,
            "__v": 0
        });
        let h = harness(FakeApi::new().with_cart(serde_json::from_value(server.clone()).unwrap()));

        h.carts.fetch_cart_details(&FakeApi::token()).await.unwrap();

        let raw = h.storage.get_item(CART_DETAILS_KEY).await.unwrap().unwrap();
        let cached: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(cached, server);
        let stored = h.store.select(|s| s.cart_details.clone()).unwrap();
        assert_eq!(serde_json::to_value(stored).unwrap(), server);
    }

    #[tokio::test]
    async fn test_fetch_cart_details_without_cart_caches_placeholder() {
        let h = harness(FakeApi::new());
        let token = FakeApi::token();
        h.store.dispatch(Action::FetchCartDetails(Cart::placeholder()));

        let cart = h.carts.fetch_cart_details(&token).await.unwrap();

        assert!(cart.is_none());
        assert!(h.store.select(|s| s.cart_details.is_none()));
        let raw = h.storage.get_item(CART_DETAILS_KEY).await.unwrap().unwrap();
        assert_eq!(
            raw,
            r#"{"_id":"","userId":"","createdAt":null,"isOpen":0}"#
        );
    }

    #[tokio::test]
    async fn test_create_cart_commits_new_cart() {
        let h = harness(FakeApi::new());
        let token = FakeApi::token();

        let cart = h.carts.create_cart(&token).await.unwrap();

        assert!(cart.is_open);
        assert_eq!(h.cache.load_cart().await.unwrap(), Some(cart.clone()));
        assert_eq!(h.store.select(|s| s.cart_details.clone()), Some(cart));
    }

    #[tokio::test]
    async fn test_close_cart_caches_normalized_closed_cart() {
        let h = harness(FakeApi::new().with_open_cart(2));
        let token = FakeApi::token();
        let cart = h.carts.fetch_cart_details(&token).await.unwrap().unwrap();
        h.carts
            .fetch_cart_items_by_cart_id(&cart.id, &token)
            .await
            .unwrap();

        let response = h.carts.close_cart(&cart.id, &token).await.unwrap();

        assert_eq!(response["acknowledged"], true);
        let cached = h.cache.load_cart().await.unwrap().unwrap();
        assert_eq!(cached.id, cart.id);
        assert!(!cached.is_open);
        assert_eq!(h.store.select(|s| s.cart_details.clone()), Some(cached));
        assert_eq!(h.cache.load_items().await.unwrap(), Some(vec![]));
        assert!(h.store.select(|s| s.cart_items.is_empty()));
    }

    #[tokio::test]
    async fn test_add_cart_item_starts_missing_cache() {
        let h = harness(FakeApi::new().with_open_cart(0));
        let token = FakeApi::token();
        let cart_id = h.api.cart().unwrap().id;

        let item = h
            .carts
            .add_cart_item(&cart_id, &ProductId::new("milk"), 2, &token)
            .await
            .unwrap();

        assert_eq!(h.cache.load_items().await.unwrap(), Some(vec![item.clone()]));
        assert_eq!(h.store.select(|s| s.cart_items.clone()), vec![item]);
    }

    #[tokio::test]
    async fn test_add_cart_item_appends_once() {
        let h = harness(FakeApi::new().with_open_cart(2));
        let token = FakeApi::token();
        let cart_id = h.api.cart().unwrap().id;
        h.carts
            .fetch_cart_items_by_cart_id(&cart_id, &token)
            .await
            .unwrap();

        let item = h
            .carts
            .add_cart_item(&cart_id, &ProductId::new("bread"), 1, &token)
            .await
            .unwrap();

        let cached = h.cache.load_items().await.unwrap().unwrap();
        assert_eq!(cached.len(), 3);
        assert_eq!(cached.last(), Some(&item));
        assert_eq!(cached.iter().filter(|i| i.id == item.id).count(), 1);
        assert_eq!(h.store.select(|s| s.cart_items.clone()), cached);
    }

    #[tokio::test]
    async fn test_delete_cart_item_removes_exactly_that_item() {
        let h = harness(FakeApi::new().with_open_cart(3));
        let token = FakeApi::token();
        let cart_id = h.api.cart().unwrap().id;
        let items = h
            .carts
            .fetch_cart_items_by_cart_id(&cart_id, &token)
            .await
            .unwrap();
        let target = items[1].id.clone();

        h.carts.delete_cart_item(&target, &token).await.unwrap();

        let cached = h.cache.load_items().await.unwrap().unwrap();
        assert_eq!(cached.len(), 2);
        assert!(cached.iter().all(|i| i.id != target));
        assert_eq!(h.store.select(|s| s.cart_items.clone()), cached);
    }

    #[tokio::test]
    async fn test_delete_unknown_item_leaves_list_unchanged() {
        let h = harness(FakeApi::new().with_open_cart(2));
        let token = FakeApi::token();
        let cart_id = h.api.cart().unwrap().id;
        let items = h
            .carts
            .fetch_cart_items_by_cart_id(&cart_id, &token)
            .await
            .unwrap();

        h.carts
            .delete_cart_item(&CartItemId::new("missing"), &token)
            .await
            .unwrap();

        assert_eq!(h.cache.load_items().await.unwrap(), Some(items));
    }

    #[tokio::test]
    async fn test_delete_with_empty_cache_succeeds() {
        let h = harness(FakeApi::new().with_open_cart(1));
        let token = FakeApi::token();
        let item_id = h.api.items()[0].id.clone();

        h.carts.delete_cart_item(&item_id, &token).await.unwrap();

        assert_eq!(h.cache.load_items().await.unwrap(), Some(vec![]));
        assert!(h.api.items().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_items_clears_cache_and_store() {
        let h = harness(FakeApi::new().with_open_cart(2));
        let token = FakeApi::token();
        let cart_id = h.api.cart().unwrap().id;
        h.carts
            .fetch_cart_items_by_cart_id(&cart_id, &token)
            .await
            .unwrap();

        h.carts
            .empty_cart_items_by_cart_id(&cart_id, &token)
            .await
            .unwrap();

        assert_eq!(h.cache.load_items().await.unwrap(), Some(vec![]));
        assert!(h.store.select(|s| s.cart_items.is_empty()));
    }

    #[tokio::test]
    async fn test_failed_call_leaves_state_untouched() {
        let h = harness(FakeApi::new().with_open_cart(0));
        let token = FakeApi::token();
        let cart_id = h.api.cart().unwrap().id;
        h.api.fail(
            Endpoint::AddCartItem,
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom",
        );

        let err = h
            .carts
            .add_cart_item(&cart_id, &ProductId::new("milk"), 1, &token)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(h.cache.load_items().await.unwrap().is_none());
        assert!(h.store.select(|s| s.cart_items.is_empty()));
    }

    #[tokio::test]
    async fn test_restore_from_cache_round_trip() {
        let h = harness(FakeApi::new().with_open_cart(2));
        let token = FakeApi::token();
        let cart = h.carts.fetch_cart_details(&token).await.unwrap().unwrap();
        h.carts
            .fetch_cart_items_by_cart_id(&cart.id, &token)
            .await
            .unwrap();

        // A fresh store over the same cache.
        let store = Arc::new(Store::new());
        let carts = CartService::new(h.api.clone(), store.clone(), h.cache.clone());
        let restored = carts.restore_from_cache().await.unwrap();

        assert_eq!(restored, Some(cart));
        assert_eq!(store.select(|s| s.cart_items.len()), 2);
    }

    #[tokio::test]
    async fn test_restore_treats_placeholder_as_no_cart() {
        let h = harness(FakeApi::new());
        h.cache.save_cart(&Cart::placeholder()).await.unwrap();

        assert_eq!(h.carts.restore_from_cache().await.unwrap(), None);
        assert!(h.store.select(|s| s.cart_details.is_none()));
    }

    #[tokio::test]
    async fn test_clear_drops_cache_and_state() {
        let h = harness(FakeApi::new().with_open_cart(1));
        let token = FakeApi::token();
        h.carts.fetch_cart_details(&token).await.unwrap();

        h.carts.clear().await.unwrap();

        assert!(h.cache.load_cart().await.unwrap().is_none());
        assert!(h.store.select(|s| s.cart_details.is_none()));
    }
}
