//! Backend REST API.
//!
//! [`StorefrontApi`] is the port the services talk to; [`HttpApi`] is the
//! `reqwest` adapter. Every authenticated call takes the bearer token
//! explicitly so services never reach into the store for it.
//!
//! # Endpoints
//!
//! | Endpoint | Method | Path |
//! |----------|--------|------|
//! | Login | POST | `/users/login` |
//! | Register | POST | `/users/register` |
//! | User details | GET | `/users/user-details` |
//! | Cities | GET | `/users/cities` |
//! | Categories | GET | `/categories` |
//! | Current cart | GET | `/shopping-carts` |
//! | Create cart | POST | `/shopping-carts/create-cart` |
//! | Close cart | PUT | `/shopping-carts/close-cart/{cartId}` |
//! | Cart items | GET | `/cart-items/{cartId}` |
//! | Add item | POST | `/cart-items/add-cart-item` |
//! | Delete item | DELETE | `/cart-items/delete-cart-item/{cartItemId}` |
//! | Empty cart | DELETE | `/cart-items/empty-cart-items/{cartId}` |

#[cfg(any(test, feature = "test-util"))]
pub mod fake;
mod http;

pub use http::HttpApi;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use thiserror::Error;

use shopfront_core::{
    AddCartItem, Cart, CartId, CartItem, CartItemId, Category, LoginCredentials, NewUser,
    SessionToken, UserDetails,
};

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Server-provided message (response body).
        message: String,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built from the configured base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Backend returned a success status without a token.
    #[error("Response did not contain a session token")]
    MissingToken,
}

impl ApiError {
    /// HTTP status of a rejected call, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A backend endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    UserDetails,
    Cities,
    Categories,
    CurrentCart,
    CreateCart,
    CloseCart,
    CartItems,
    AddCartItem,
    DeleteCartItem,
    EmptyCartItems,
}

impl Endpoint {
    /// HTTP method used for this endpoint.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Login | Self::Register | Self::CreateCart | Self::AddCartItem => Method::POST,
            Self::CloseCart => Method::PUT,
            Self::DeleteCartItem | Self::EmptyCartItems => Method::DELETE,
            Self::UserDetails
            | Self::Cities
            | Self::Categories
            | Self::CurrentCart
            | Self::CartItems => Method::GET,
        }
    }

    /// Path relative to the API base URL, without the trailing id segment.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "users/login",
            Self::Register => "users/register",
            Self::UserDetails => "users/user-details",
            Self::Cities => "users/cities",
            Self::Categories => "categories",
            Self::CurrentCart => "shopping-carts",
            Self::CreateCart => "shopping-carts/create-cart",
            Self::CloseCart => "shopping-carts/close-cart",
            Self::CartItems => "cart-items",
            Self::AddCartItem => "cart-items/add-cart-item",
            Self::DeleteCartItem => "cart-items/delete-cart-item",
            Self::EmptyCartItems => "cart-items/empty-cart-items",
        }
    }
}

/// The backend as seen by the client services.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Exchange credentials for a session token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<SessionToken, ApiError>;

    /// Create an account and return its session token.
    async fn register(&self, user: &NewUser) -> Result<SessionToken, ApiError>;

    /// Identity of the token's user.
    async fn user_details(&self, token: &SessionToken) -> Result<UserDetails, ApiError>;

    /// Cities selectable during registration.
    async fn cities(&self) -> Result<Vec<String>, ApiError>;

    /// Product categories.
    async fn categories(&self, token: &SessionToken) -> Result<Vec<Category>, ApiError>;

    /// The user's current cart, `None` when the backend reports none.
    async fn current_cart(&self, token: &SessionToken) -> Result<Option<Cart>, ApiError>;

    /// Open a new cart.
    async fn create_cart(&self, token: &SessionToken) -> Result<Cart, ApiError>;

    /// Close a cart, returning the backend's payload as-is.
    async fn close_cart(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<serde_json::Value, ApiError>;

    /// Items in a cart.
    async fn cart_items(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<Vec<CartItem>, ApiError>;

    /// Add an item to a cart.
    async fn add_cart_item(
        &self,
        item: &AddCartItem,
        token: &SessionToken,
    ) -> Result<CartItem, ApiError>;

    /// Delete one cart item.
    async fn delete_cart_item(
        &self,
        item_id: &CartItemId,
        token: &SessionToken,
    ) -> Result<(), ApiError>;

    /// Delete every item in a cart.
    async fn empty_cart_items(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "Incorrect email or password".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 401 Unauthorized: Incorrect email or password"
        );
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(ApiError::MissingToken.status(), None);
    }

    #[test]
    fn test_endpoint_methods() {
        assert_eq!(Endpoint::CurrentCart.method(), Method::GET);
        assert_eq!(Endpoint::CreateCart.method(), Method::POST);
        assert_eq!(Endpoint::CloseCart.method(), Method::PUT);
        assert_eq!(Endpoint::EmptyCartItems.method(), Method::DELETE);
    }

    #[test]
    fn test_endpoint_paths_have_no_leading_slash() {
        let all = [
            Endpoint::Login,
            Endpoint::Register,
            Endpoint::UserDetails,
            Endpoint::Cities,
            Endpoint::Categories,
            Endpoint::CurrentCart,
            Endpoint::CreateCart,
            Endpoint::CloseCart,
            Endpoint::CartItems,
            Endpoint::AddCartItem,
            Endpoint::DeleteCartItem,
            Endpoint::EmptyCartItems,
        ];
        for endpoint in all {
            assert!(!endpoint.path().starts_with('/'), "{endpoint:?}");
            assert!(!endpoint.path().contains("//"), "{endpoint:?}");
        }
    }
}
