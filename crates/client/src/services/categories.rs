//! Category service.

use std::sync::Arc;

use tracing::{debug, instrument};

use shopfront_core::{Category, SessionToken};

use crate::api::StorefrontApi;
use crate::error::Result;
use crate::store::{Action, Store};

/// Loads product categories into the store.
#[derive(Clone)]
pub struct CategoryService {
    api: Arc<dyn StorefrontApi>,
    store: Arc<Store>,
}

impl CategoryService {
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>, store: Arc<Store>) -> Self {
        Self { api, store }
    }

    /// Fetch all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_categories(&self, token: &SessionToken) -> Result<Vec<Category>> {
        let categories = self.api.categories(token).await?;
        self.store
            .dispatch(Action::SetCategories(categories.clone()));
        debug!(count = categories.len(), "Categories loaded");
        Ok(categories)
    }
}
