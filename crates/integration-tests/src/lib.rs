//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_lifecycle` - Cart service against the fake backend and a file cache
//! - `login_flow` - Login form, shopping entry points, token listener
//! - `registration_flow` - Registration form validation and submit sequence
//!
//! Every test runs against the in-process `FakeApi`; no server is needed.

use std::sync::Arc;

use shopfront_client::api::fake::FakeApi;
use shopfront_client::cache::{CartCache, FileStorage, LocalStorage, MemoryStorage};
use shopfront_client::flows::RecordingNavigator;
use shopfront_client::{ClientConfig, Shopfront};
use shopfront_core::{LoginCredentials, SessionToken};
use tempfile::TempDir;

/// Email of the account `FakeApi` starts with.
pub const CUSTOMER_EMAIL: &str = "customer@shop.test";

/// Password of the account `FakeApi` starts with.
pub const CUSTOMER_PASSWORD: &str = "secret";

/// A client wired to a fake backend, with a navigator that records routes.
pub struct TestContext {
    pub api: Arc<FakeApi>,
    pub shopfront: Shopfront,
    pub navigator: Arc<RecordingNavigator>,
    /// Cache view over the same storage the client writes.
    pub cache: CartCache,
    cache_dir: Option<TempDir>,
}

impl TestContext {
    /// Client with a file-backed cache in a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(api: FakeApi) -> Self {
        let dir = tempfile::tempdir().expect("create cache dir");
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(dir.path()));
        Self::build(api, storage, Some(dir))
    }

    /// Client with an in-memory cache. Use with paused time.
    #[must_use]
    pub fn in_memory(api: FakeApi) -> Self {
        Self::build(api, Arc::new(MemoryStorage::new()), None)
    }

    fn build(api: FakeApi, storage: Arc<dyn LocalStorage>, cache_dir: Option<TempDir>) -> Self {
        let api = Arc::new(api);
        let shopfront =
            Shopfront::from_parts(api.clone(), storage.clone(), &ClientConfig::default());
        Self {
            api,
            shopfront,
            navigator: Arc::new(RecordingNavigator::new()),
            cache: CartCache::new(storage),
            cache_dir,
        }
    }

    /// A second client sharing this one's cache directory, as after a restart.
    ///
    /// Returns `None` for in-memory contexts.
    #[must_use]
    pub fn restarted(&self) -> Option<Shopfront> {
        let dir = self.cache_dir.as_ref()?;
        Some(Shopfront::from_parts(
            self.api.clone(),
            Arc::new(FileStorage::new(dir.path())),
            &ClientConfig::default(),
        ))
    }

    /// Log in as the fake backend's customer through the user service.
    ///
    /// # Panics
    ///
    /// Panics if the fake backend rejects the login.
    #[allow(clippy::expect_used)]
    pub async fn login(&self) -> SessionToken {
        let credentials = LoginCredentials {
            email: CUSTOMER_EMAIL.to_string(),
            password: CUSTOMER_PASSWORD.to_string(),
        };
        self.shopfront
            .users()
            .login(&credentials)
            .await
            .expect("fake login succeeds")
    }
}
