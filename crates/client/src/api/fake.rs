//! In-process fake backend for tests.
//!
//! [`FakeApi`] keeps one user account, their cart and items in memory and
//! answers like the real backend: wrong credentials are a 401, an unknown
//! token is a 401, and `GET /shopping-carts` returns nothing when there is
//! no open cart. Every call is recorded so tests can assert ordering, and
//! any endpoint can be made to fail with a chosen status.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;

use shopfront_core::{
    AddCartItem, Cart, CartId, CartItem, CartItemId, Category, CategoryId, LoginCredentials,
    NewUser, SessionToken, UserDetails, UserId,
};

use super::{ApiError, Endpoint, StorefrontApi};

/// Token issued by [`FakeApi`] for its account.
pub const FAKE_TOKEN: &str = "fake.jwt.token";

/// Fake storefront backend.
#[derive(Debug)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

#[derive(Debug)]
struct FakeState {
    email: String,
    password: String,
    user: UserDetails,
    cart: Option<Cart>,
    items: Vec<CartItem>,
    categories: Vec<Category>,
    cities: Vec<String>,
    failures: HashMap<Endpoint, (StatusCode, String)>,
    calls: Vec<Endpoint>,
    next_id: u32,
}

impl FakeApi {
    /// A backend with one customer account `customer@shop.test` / `secret`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                email: "customer@shop.test".to_string(),
                password: "secret".to_string(),
                user: UserDetails {
                    id: UserId::new("user-1"),
                    id_num: Some("123456789".to_string()),
                    email: "customer@shop.test".to_string(),
                    first_name: "Dana".to_string(),
                    last_name: "Levi".to_string(),
                    city: Some("Haifa".to_string()),
                    street: Some("Herzl 1".to_string()),
                    is_admin: false,
                },
                cart: None,
                items: Vec::new(),
                categories: vec![
                    Category {
                        id: CategoryId::new("cat-1"),
                        name: "Dairy".to_string(),
                    },
                    Category {
                        id: CategoryId::new("cat-2"),
                        name: "Bakery".to_string(),
                    },
                ],
                cities: vec!["Haifa".to_string(), "Tel Aviv".to_string()],
                failures: HashMap::new(),
                calls: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Make the account an administrator.
    #[must_use]
    pub fn with_admin(self) -> Self {
        self.lock().user.is_admin = true;
        self
    }

    /// Start with an open cart holding `items` products (quantity 1 each).
    #[must_use]
    pub fn with_open_cart(self, items: usize) -> Self {
        {
            let mut state = self.lock();
            let cart = state.new_cart();
            for n in 0..items {
                let item = state.new_item(&cart.id, &format!("product-{n}"), 1);
                state.items.push(item);
            }
            state.cart = Some(cart);
        }
        self
    }

    /// Start with `cart` as the user's current cart, exactly as given.
    #[must_use]
    pub fn with_cart(self, cart: Cart) -> Self {
        self.lock().cart = Some(cart);
        self
    }

    /// Make every subsequent call to `endpoint` fail with `status`/`message`.
    pub fn fail(&self, endpoint: Endpoint, status: StatusCode, message: &str) {
        self.lock()
            .failures
            .insert(endpoint, (status, message.to_string()));
    }

    /// Endpoints called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    /// The backend's current cart.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.lock().cart.clone()
    }

    /// The backend's current items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    /// The token this backend accepts.
    #[must_use]
    #[allow(clippy::expect_used, clippy::missing_panics_doc)]
    pub fn token() -> SessionToken {
        SessionToken::new(FAKE_TOKEN).expect("FAKE_TOKEN is non-empty")
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A poisoned lock only happens after a test already panicked.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record the call and apply any configured failure.
    fn enter(&self, endpoint: Endpoint) -> Result<MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.lock();
        state.calls.push(endpoint);
        if let Some((status, message)) = state.failures.get(&endpoint) {
            return Err(ApiError::Status {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(state)
    }

    fn enter_authenticated(
        &self,
        endpoint: Endpoint,
        token: &SessionToken,
    ) -> Result<MutexGuard<'_, FakeState>, ApiError> {
        let state = self.enter(endpoint)?;
        if token.expose() != FAKE_TOKEN {
            return Err(ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid token".to_string(),
            });
        }
        Ok(state)
    }
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn new_cart(&mut self) -> Cart {
        Cart {
            id: CartId::new(self.next_id("cart")),
            user_id: self.user.id.clone(),
            created_at: Some(
                DateTime::<Utc>::UNIX_EPOCH.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            is_open: true,
            extra: serde_json::Map::new(),
        }
    }

    fn new_item(&mut self, cart_id: &CartId, product: &str, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(self.next_id("item")),
            cart_id: cart_id.clone(),
            product: product.into(),
            quantity,
            total_price: None,
            extra: serde_json::Map::new(),
        }
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::BAD_REQUEST,
        message: message.to_string(),
    }
}

#[async_trait]
impl StorefrontApi for FakeApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<SessionToken, ApiError> {
        let state = self.enter(Endpoint::Login)?;
        if credentials.email != state.email || credentials.password != state.password {
            return Err(ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                message: "Incorrect email or password".to_string(),
            });
        }
        Ok(Self::token())
    }

    async fn register(&self, user: &NewUser) -> Result<SessionToken, ApiError> {
        let mut state = self.enter(Endpoint::Register)?;
        if user.email == state.email {
            return Err(bad_request("Email already registered"));
        }
        state.email.clone_from(&user.email);
        state.password.clone_from(&user.password);
        let id = UserId::new(state.next_id("user"));
        state.user = UserDetails {
            id,
            id_num: Some(user.id_num.clone()),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            city: Some(user.city.clone()),
            street: Some(user.street.clone()),
            is_admin: false,
        };
        state.cart = None;
        state.items.clear();
        Ok(Self::token())
    }

    async fn user_details(&self, token: &SessionToken) -> Result<UserDetails, ApiError> {
        let state = self.enter_authenticated(Endpoint::UserDetails, token)?;
        Ok(state.user.clone())
    }

    async fn cities(&self) -> Result<Vec<String>, ApiError> {
        let state = self.enter(Endpoint::Cities)?;
        Ok(state.cities.clone())
    }

    async fn categories(&self, token: &SessionToken) -> Result<Vec<Category>, ApiError> {
        let state = self.enter_authenticated(Endpoint::Categories, token)?;
        Ok(state.categories.clone())
    }

    async fn current_cart(&self, token: &SessionToken) -> Result<Option<Cart>, ApiError> {
        let state = self.enter_authenticated(Endpoint::CurrentCart, token)?;
        Ok(state.cart.clone().filter(|cart| cart.is_open))
    }

    async fn create_cart(&self, token: &SessionToken) -> Result<Cart, ApiError> {
        let mut state = self.enter_authenticated(Endpoint::CreateCart, token)?;
        let cart = state.new_cart();
        state.cart = Some(cart.clone());
        state.items.clear();
        Ok(cart)
    }

    async fn close_cart(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<serde_json::Value, ApiError> {
        let mut state = self.enter_authenticated(Endpoint::CloseCart, token)?;
        let Some(cart) = state.cart.as_mut().filter(|cart| cart.id == *cart_id) else {
            return Err(bad_request("Cart not found"));
        };
        cart.is_open = false;
        // The backend answers with a write acknowledgement, not the cart.
        Ok(serde_json::json!({ "acknowledged": true, "modifiedCount": 1 }))
    }

    async fn cart_items(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<Vec<CartItem>, ApiError> {
        let state = self.enter_authenticated(Endpoint::CartItems, token)?;
        Ok(state
            .items
            .iter()
            .filter(|item| item.cart_id == *cart_id)
            .cloned()
            .collect())
    }

    async fn add_cart_item(
        &self,
        item: &AddCartItem,
        token: &SessionToken,
    ) -> Result<CartItem, ApiError> {
        let mut state = self.enter_authenticated(Endpoint::AddCartItem, token)?;
        if item.quantity == 0 {
            return Err(bad_request("Quantity must be positive"));
        }
        let created = state.new_item(&item.cart_id, item.product.as_str(), item.quantity);
        state.items.push(created.clone());
        Ok(created)
    }

    async fn delete_cart_item(
        &self,
        item_id: &CartItemId,
        token: &SessionToken,
    ) -> Result<(), ApiError> {
        let mut state = self.enter_authenticated(Endpoint::DeleteCartItem, token)?;
        state.items.retain(|item| item.id != *item_id);
        Ok(())
    }

    async fn empty_cart_items(
        &self,
        cart_id: &CartId,
        token: &SessionToken,
    ) -> Result<(), ApiError> {
        let mut state = self.enter_authenticated(Endpoint::EmptyCartItems, token)?;
        state.items.retain(|item| item.cart_id != *cart_id);
        Ok(())
    }
}
