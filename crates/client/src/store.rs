//! Shared application state.
//!
//! The [`Store`] is the single writer of [`AppState`]: every change goes
//! through [`Store::dispatch`], which applies an [`Action`] with a pure
//! reducer. Readers take a value with [`Store::select`] or follow changes
//! through a [`Store::subscribe`] receiver.

use tokio::sync::watch;
use tracing::trace;

use shopfront_core::{Cart, CartItem, CartItemId, Category, SessionToken, UserDetails};

/// Everything the client knows about the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Bearer token, `None` before login.
    pub jwt: Option<SessionToken>,
    /// Logged-in user.
    pub user_details: Option<UserDetails>,
    /// Current cart, `None` when the user has none.
    pub cart_details: Option<Cart>,
    /// Items of the current cart.
    pub cart_items: Vec<CartItem>,
    /// Product categories.
    pub categories: Vec<Category>,
    /// Cities offered by the registration form.
    pub cities: Vec<String>,
}

/// A state change.
#[derive(Debug, Clone)]
pub enum Action {
    SetJwt(SessionToken),
    SetUserDetails(UserDetails),
    FetchCartDetails(Cart),
    ResetCartDetails,
    CloseCart,
    FetchCartItems(Vec<CartItem>),
    AddCartItem(CartItem),
    DeleteCartItem(CartItemId),
    EmptyCartItems,
    SetCategories(Vec<Category>),
    SetCities(Vec<String>),
    /// Drop the session: token, user, cart and items.
    Logout,
}

impl AppState {
    /// Apply an action.
    pub fn reduce(&mut self, action: Action) {
        match action {
            Action::SetJwt(token) => self.jwt = Some(token),
            Action::SetUserDetails(user) => self.user_details = Some(user),
            Action::FetchCartDetails(cart) => self.cart_details = Some(cart),
            Action::ResetCartDetails => self.cart_details = None,
            Action::CloseCart => {
                if let Some(cart) = self.cart_details.as_mut() {
                    cart.is_open = false;
                }
            }
            Action::FetchCartItems(items) => self.cart_items = items,
            Action::AddCartItem(item) => self.cart_items.push(item),
            Action::DeleteCartItem(id) => self.cart_items.retain(|item| item.id != id),
            Action::EmptyCartItems => self.cart_items.clear(),
            Action::SetCategories(categories) => self.categories = categories,
            Action::SetCities(cities) => self.cities = cities,
            Action::Logout => {
                self.jwt = None;
                self.user_details = None;
                self.cart_details = None;
                self.cart_items.clear();
            }
        }
    }
}

/// Subscribable holder of [`AppState`].
#[derive(Debug)]
pub struct Store {
    state: watch::Sender<AppState>,
}

impl Store {
    /// A store with the empty initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// A store seeded with `state`.
    #[must_use]
    pub fn with_state(state: AppState) -> Self {
        let (state, _) = watch::channel(state);
        Self { state }
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: Action) {
        trace!(action = action_name(&action), "Dispatching action");
        self.state.send_modify(|state| state.reduce(action));
    }

    /// Read a value out of the current state.
    pub fn select<T>(&self, f: impl FnOnce(&AppState) -> T) -> T {
        f(&self.state.borrow())
    }

    /// Copy of the whole current state.
    #[must_use]
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Current session token.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.select(|state| state.jwt.clone())
    }

    /// Receiver that observes the current state and every later dispatch.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Action name without its payload, which may hold tokens or personal data.
const fn action_name(action: &Action) -> &'static str {
    match action {
        Action::SetJwt(_) => "SetJwt",
        Action::SetUserDetails(_) => "SetUserDetails",
        Action::FetchCartDetails(_) => "FetchCartDetails",
        Action::ResetCartDetails => "ResetCartDetails",
        Action::CloseCart => "CloseCart",
        Action::FetchCartItems(_) => "FetchCartItems",
        Action::AddCartItem(_) => "AddCartItem",
        Action::DeleteCartItem(_) => "DeleteCartItem",
        Action::EmptyCartItems => "EmptyCartItems",
        Action::SetCategories(_) => "SetCategories",
        Action::SetCities(_) => "SetCities",
        Action::Logout => "Logout",
    }
}
