//! `reqwest` implementation of [`StorefrontApi`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use shopfront_core::{
    AddCartItem, Cart, CartId, CartItem, CartItemId, Category, LoginCredentials, NewUser,
    SessionToken, UserDetails,
};

use super::{ApiError, Endpoint, StorefrontApi};

/// Maximum number of body characters copied into logs.
const LOG_BODY_LIMIT: usize = 500;

/// Token payload: login answers with a bare JSON string, register with
/// `{ "jwt": "..." }`. Both are accepted for either call.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Bare(String),
    Wrapped { jwt: String },
}

impl TokenResponse {
    fn into_token(self) -> Result<SessionToken, ApiError> {
        let raw = match self {
            Self::Bare(raw) | Self::Wrapped { jwt: raw } => raw,
        };
        SessionToken::new(raw).ok_or(ApiError::MissingToken)
    }
}

/// HTTP client for the storefront backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpApi {
    inner: Arc<HttpApiInner>,
}

struct HttpApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpApi {
    /// Create a client for the backend at `base_url`.
    ///
    /// A trailing slash is added to the base path so relative endpoint
    /// paths are appended rather than replacing its last segment.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Like [`HttpApi::new`], sending through a preconfigured `client`.
    #[must_use]
    pub fn with_client(mut base_url: Url, client: reqwest::Client) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            inner: Arc::new(HttpApiInner { client, base_url }),
        }
    }

    /// Base URL every endpoint path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build the URL for an endpoint, appending `id` as its own path segment.
    fn url(&self, endpoint: Endpoint, id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.join(endpoint.path())?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|()| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
                .push(id);
        }
        Ok(url)
    }

    fn request(
        &self,
        endpoint: Endpoint,
        id: Option<&str>,
        token: Option<&SessionToken>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(endpoint, id)?;
        let mut request = self
            .inner
            .client
            .request(endpoint.method(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }
        Ok(request)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Read the body first; error responses carry the user-facing message.
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                endpoint = ?endpoint,
                status = %status,
                body = %truncate(&body),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status,
                message: server_message(&body),
            });
        }

        debug!(endpoint = ?endpoint, status = %status, "Backend call succeeded");
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        id: Option<&str>,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        let request = self.request(endpoint, id, token)?;
        let body = self.send(endpoint, request).await?;
        decode(endpoint, &body)
    }
}

/// Decode a JSON body, logging the payload when it does not match.
fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            endpoint = ?endpoint,
            error = %e,
            body = %truncate(body),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

/// Extract the user-facing message from an error body.
///
/// The backend sends either plain text, a JSON string, or an object with a
/// `message` field.
fn server_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(message)) => message,
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| body.trim().to_string(), str::to_string),
        _ => body.trim().to_string(),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[async_trait]
impl StorefrontApi for HttpApi {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &LoginCredentials) -> Result<SessionToken, ApiError> {
        let request = self.request(Endpoint::Login, None, None)?.json(credentials);
        let body = self.send(Endpoint::Login, request).await?;
        decode::<TokenResponse>(Endpoint::Login, &body)?.into_token()
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn register(&self, user: &NewUser) -> Result<SessionToken, ApiError> {
        let request = self.request(Endpoint::Register, None, None)?.json(user);
        let body = self.send(Endpoint::Register, request).await?;
        decode::<TokenResponse>(Endpoint::Register, &body)?.into_token()
    }

    #[instrument(skip(self, token))]
    async fn user_details(&self, token: &SessionToken) -> Result<UserDetails, ApiError> {
        self.get(Endpoint::UserDetails, None, Some(token)).await
    }

    #[instrument(skip(self))]
    async fn cities(&self) -> Result<Vec<String>, ApiError> {
        self.get(Endpoint::Cities, None, None).await
    }

    #[instrument(skip(self, token))]
    async fn categories(&self, token: &SessionToken) -> Result<Vec<Category>, ApiError> {
        self.get(Endpoint::Categories, None, Some(token)).await
    }

    #[instrument(skip(self, token))]
    async fn current_cart(&self, token: &SessionToken) -> Result<Option<Cart>, ApiError> {
        let request = self.request(Endpoint::CurrentCart, None, Some(token))?;
        let body = self.send(Endpoint::CurrentCart, request).await?;

        // No cart is reported as an empty body or `null`.
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(Endpoint::CurrentCart, &body)
    }

    #[instrument(skip(self, token))]
    async fn create_cart(&self, token: &SessionToken) -> Result<Cart, ApiError> {
        let request = self
            .request(Endpoint::CreateCart, None, Some(token))?
            .json(&serde_json::json!({}));
        let body = self.send(Endpoint::CreateCart, request).await?;
        decode(Endpoint::CreateCart, &body)
    }

    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    async fn close_cart(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<serde_json::Value, ApiError> {
        let request = self
            .request(Endpoint::CloseCart, Some(cart_id.as_str()), Some(token))?
            .json(&serde_json::json!({}));
        let body = self.send(Endpoint::CloseCart, request).await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        decode(Endpoint::CloseCart, &body)
    }

    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    async fn cart_items(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<Vec<CartItem>, ApiError> {
        self.get(Endpoint::CartItems, Some(cart_id.as_str()), Some(token))
            .await
    }

    #[instrument(skip(self, item, token), fields(cart_id = %item.cart_id, product = %item.product))]
    async fn add_cart_item(
        &self,
        item: &AddCartItem,
        token: &SessionToken,
    ) -> Result<CartItem, ApiError> {
        let request = self
            .request(Endpoint::AddCartItem, None, Some(token))?
            .json(item);
        let body = self.send(Endpoint::AddCartItem, request).await?;
        decode(Endpoint::AddCartItem, &body)
    }

    #[instrument(skip(self, token), fields(item_id = %item_id))]
    async fn delete_cart_item(
        &self,
        item_id: &CartItemId,
        token: &SessionToken,
    ) -> Result<(), ApiError> {
        let request = self.request(Endpoint::DeleteCartItem, Some(item_id.as_str()), Some(token))?;
        self.send(Endpoint::DeleteCartItem, request).await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    async fn empty_cart_items(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<(), ApiError> {
        let request = self.request(Endpoint::EmptyCartItems, Some(cart_id.as_str()), Some(token))?;
        self.send(Endpoint::EmptyCartItems, request).await?;
        Ok(())
    }
}
