//! Wiring of the client's parts.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{HttpApi, StorefrontApi};
use crate::cache::{CartCache, FileStorage, LocalStorage, MemoryStorage};
use crate::config::ClientConfig;
use crate::flows::{LoginFlow, Navigator, RegisterFlow};
use crate::services::{CartService, CategoryService, UserService};
use crate::store::Store;

/// One client session: the store, the services sharing it, and factories
/// for the flows.
///
/// Cloning is cheap and every clone shares the same store and cache.
#[derive(Clone)]
pub struct Shopfront {
    store: Arc<Store>,
    carts: CartService,
    users: UserService,
    categories: CategoryService,
    login_error_display: Duration,
    register_error_display: Duration,
}

impl Shopfront {
    /// Build a client talking to the configured backend over HTTP.
    ///
    /// The cart cache lives in `config.cache_dir` when set, in memory
    /// otherwise.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let api = Arc::new(HttpApi::new(config.api_url.clone()));
        let storage: Arc<dyn LocalStorage> = match &config.cache_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::from_parts(api, storage, config)
    }

    /// Build a client from an explicit API and cache storage.
    #[must_use]
    pub fn from_parts(
        api: Arc<dyn StorefrontApi>,
        storage: Arc<dyn LocalStorage>,
        config: &ClientConfig,
    ) -> Self {
        let store = Arc::new(Store::new());
        let carts = CartService::new(api.clone(), store.clone(), CartCache::new(storage));
        let users = UserService::new(api.clone(), store.clone(), carts.clone());
        let categories = CategoryService::new(api, store.clone());

        Self {
            store,
            carts,
            users,
            categories,
            login_error_display: config.login_error_display,
            register_error_display: config.register_error_display,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    #[must_use]
    pub const fn carts(&self) -> &CartService {
        &self.carts
    }

    #[must_use]
    pub const fn users(&self) -> &UserService {
        &self.users
    }

    #[must_use]
    pub const fn categories(&self) -> &CategoryService {
        &self.categories
    }

    /// A login flow bound to this session. Call [`LoginFlow::init`] to
    /// start following the token.
    #[must_use]
    pub fn login_flow(&self, navigator: Arc<dyn Navigator>) -> LoginFlow {
        LoginFlow::new(
            self.users.clone(),
            self.carts.clone(),
            self.store.clone(),
            navigator,
        )
        .with_error_display(self.login_error_display)
    }

    /// A registration flow bound to this session.
    #[must_use]
    pub fn register_flow(&self, navigator: Arc<dyn Navigator>) -> RegisterFlow {
        RegisterFlow::new(
            self.users.clone(),
            self.carts.clone(),
            self.categories.clone(),
            self.store.clone(),
            navigator,
        )
        .with_error_display(self.register_error_display)
    }
}

impl std::fmt::Debug for Shopfront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shopfront")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
