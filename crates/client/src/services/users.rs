//! User service: authentication and identity.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use shopfront_core::{LoginCredentials, NewUser, SessionToken, UserDetails};

use crate::api::StorefrontApi;
use crate::error::Result;
use crate::services::CartService;
use crate::store::{Action, Store};

/// Login, registration and user details.
#[derive(Clone)]
pub struct UserService {
    api: Arc<dyn StorefrontApi>,
    store: Arc<Store>,
    carts: CartService,
}

impl UserService {
    /// Create a user service. The cart service is used to drop cart state
    /// on logout.
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>, store: Arc<Store>, carts: CartService) -> Self {
        Self { api, store, carts }
    }

    /// Exchange credentials for a session token and store it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials (401) or the
    /// call fails.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<SessionToken> {
        let token = self.api.login(credentials).await?;
        self.store.dispatch(Action::SetJwt(token.clone()));
        info!("Logged in");
        Ok(token)
    }

    /// Create an account, store its session token and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the form (400) or the call
    /// fails.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn register(&self, user: &NewUser) -> Result<SessionToken> {
        let token = self.api.register(user).await?;
        self.store.dispatch(Action::SetJwt(token.clone()));
        info!("Registered");
        Ok(token)
    }

    /// Fetch and store the token's user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_user_details(&self, token: &SessionToken) -> Result<UserDetails> {
        let user = self.api.user_details(token).await?;
        self.store.dispatch(Action::SetUserDetails(user.clone()));
        debug!(user_id = %user.id, is_admin = user.is_admin, "User details loaded");
        Ok(user)
    }

    /// Fetch and store the cities offered at registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn fetch_cities(&self) -> Result<Vec<String>> {
        let cities = self.api.cities().await?;
        self.store.dispatch(Action::SetCities(cities.clone()));
        Ok(cities)
    }

    /// End the session: clear the cart cache, then the token, user and
    /// cart state.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be cleared. The session is then
    /// left in place so the store still matches what the cache holds.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.carts.clear().await?;
        self.store.dispatch(Action::Logout);
        info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::cache::{CacheError, CartCache, LocalStorage, MemoryStorage};
    use crate::error::ClientError;
    use async_trait::async_trait;
    use reqwest::StatusCode;

    /// Storage that reads and writes but cannot delete.
    struct UndeletableStorage(MemoryStorage);

    #[async_trait]
    impl LocalStorage for UndeletableStorage {
        async fn get_item(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
            self.0.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: String) -> std::result::Result<(), CacheError> {
            self.0.set_item(key, value).await
        }

        async fn remove_item(&self, _key: &str) -> std::result::Result<(), CacheError> {
            Err(CacheError::Io(std::io::Error::other("read-only cache")))
        }
    }

    fn service(api: FakeApi) -> (Arc<Store>, CartCache, UserService) {
        let api: Arc<dyn StorefrontApi> = Arc::new(api);
        let store = Arc::new(Store::new());
        let cache = CartCache::new(Arc::new(MemoryStorage::new()));
        let carts = CartService::new(api.clone(), store.clone(), cache.clone());
        (store.clone(), cache, UserService::new(api, store, carts))
    }

    fn credentials(password: &str) -> LoginCredentials {
        LoginCredentials {
            email: "customer@shop.test".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let (store, _, users) = service(FakeApi::new());

        let token = users.login(&credentials("secret")).await.unwrap();

        assert_eq!(store.token(), Some(token));
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_store_empty() {
        let (store, _, users) = service(FakeApi::new());

        let err = users.login(&credentials("wrong")).await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.server_message(), Some("Incorrect email or password"));
        assert!(store.token().is_none());
    }

    #[tokio::test]
    async fn test_user_details_and_cities() {
        let (store, _, users) = service(FakeApi::new().with_admin());

        let user = users.fetch_user_details(&FakeApi::token()).await.unwrap();
        let cities = users.fetch_cities().await.unwrap();

        assert!(user.is_admin);
        assert_eq!(store.select(|s| s.user_details.clone()), Some(user));
        assert_eq!(store.select(|s| s.cities.clone()), cities);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_cache() {
        let (store, cache, users) = service(FakeApi::new().with_open_cart(1));
        let token = users.login(&credentials("secret")).await.unwrap();
        users.carts.fetch_cart_details(&token).await.unwrap();
        assert!(cache.load_cart().await.unwrap().is_some());

        users.logout().await.unwrap();

        assert!(store.token().is_none());
        assert!(store.select(|s| s.cart_details.is_none()));
        assert!(cache.load_cart().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_keeps_session_when_cache_cannot_be_cleared() {
        let api: Arc<dyn StorefrontApi> = Arc::new(FakeApi::new().with_open_cart(1));
        let store = Arc::new(Store::new());
        let cache = CartCache::new(Arc::new(UndeletableStorage(MemoryStorage::new())));
        let carts = CartService::new(api.clone(), store.clone(), cache.clone());
        let users = UserService::new(api, store.clone(), carts);
        let token = users.login(&credentials("secret")).await.unwrap();
        let cart = users.carts.fetch_cart_details(&token).await.unwrap();

        let err = users.logout().await.unwrap_err();

        assert!(matches!(err, ClientError::Cache(CacheError::Io(_))));
        // Store and cache still agree: a later restore brings back nothing
        // the store has already forgotten.
        assert_eq!(cache.load_cart().await.unwrap(), cart);
        assert_eq!(store.select(|s| s.cart_details.clone()), cart);
        assert_eq!(store.token(), Some(token));
    }
}
