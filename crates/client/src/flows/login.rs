//! Login flow.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{error, info, instrument};

use shopfront_core::LoginCredentials;

use super::{FlashMessage, LOGIN_ERROR_DISPLAY, Navigator, Route, SubmitOutcome, TokenListener};
use crate::error::{ClientError, Result};
use crate::services::{CartService, UserService};
use crate::store::Store;

/// Login form fields.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Clear both fields.
    pub fn reset(&mut self) {
        self.email.clear();
        self.password.clear();
    }

    fn credentials(&self) -> LoginCredentials {
        LoginCredentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The login box: sign in, then start or resume shopping.
pub struct LoginFlow {
    users: UserService,
    carts: CartService,
    store: Arc<Store>,
    navigator: Arc<dyn Navigator>,
    flash: FlashMessage,
    error_display: Duration,
    listener: Option<TokenListener>,
}

impl LoginFlow {
    #[must_use]
    pub fn new(
        users: UserService,
        carts: CartService,
        store: Arc<Store>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            users,
            carts,
            store,
            navigator,
            flash: FlashMessage::new(),
            error_display: LOGIN_ERROR_DISPLAY,
            listener: None,
        }
    }

    /// Override how long a rejected login message stays visible.
    #[must_use]
    pub const fn with_error_display(mut self, ttl: Duration) -> Self {
        self.error_display = ttl;
        self
    }

    /// Start following the session token: each new token triggers a cart
    /// details fetch in the background. Calling this twice restarts the
    /// listener.
    pub fn init(&mut self) {
        self.listener = Some(TokenListener::spawn(&self.store, self.carts.clone()));
    }

    /// Whether a token listener is running.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|listener| !listener.is_finished())
    }

    /// Stop the token listener started by [`LoginFlow::init`].
    pub fn stop_listening(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.shutdown();
        }
    }

    /// Inline message shown after a rejected login.
    #[must_use]
    pub const fn message(&self) -> &FlashMessage {
        &self.flash
    }

    /// Open a new cart with the current token and go shopping.
    ///
    /// Without a token, or if the cart cannot be created, goes to the error
    /// view instead.
    #[instrument(skip(self))]
    pub async fn start_shopping(&self) -> Route {
        let route = match self.open_cart().await {
            Ok(()) => Route::Shopping,
            Err(e) => {
                error!(error = %e, "Failed to start shopping");
                Route::Error
            }
        };
        self.navigator.navigate(route);
        route
    }

    /// Go back to the shopping view.
    pub fn resume_shopping(&self) -> Route {
        self.navigator.navigate(Route::Shopping);
        Route::Shopping
    }

    /// Submit the form.
    ///
    /// Logs in, clears the form, loads the user and their cart (and its
    /// items when there is one). Administrators go straight to the shopping
    /// view; customers stay so they can choose to start or resume shopping.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn submit(&self, form: &mut LoginForm) -> SubmitOutcome {
        match self.sign_in(form).await {
            Ok(true) => {
                self.navigator.navigate(Route::Shopping);
                SubmitOutcome::Navigated(Route::Shopping)
            }
            Ok(false) => SubmitOutcome::Stayed,
            Err(e) if e.status() == Some(StatusCode::UNAUTHORIZED) => {
                let message = e.server_message().unwrap_or_default().to_string();
                info!(message = %message, "Login rejected");
                self.flash.show(message.clone(), self.error_display);
                SubmitOutcome::Rejected(message)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.navigator.navigate(Route::Error);
                SubmitOutcome::Navigated(Route::Error)
            }
        }
    }

    async fn open_cart(&self) -> Result<()> {
        let token = self.store.token().ok_or(ClientError::MissingToken)?;
        self.carts.create_cart(&token).await?;
        Ok(())
    }

    /// Returns whether the user is an administrator.
    async fn sign_in(&self, form: &mut LoginForm) -> Result<bool> {
        let token = self.users.login(&form.credentials()).await?;
        form.reset();

        let user = self.users.fetch_user_details(&token).await?;

        if let Some(cart) = self.carts.fetch_cart_details(&token).await? {
            self.carts
                .fetch_cart_items_by_cart_id(&cart.id, &token)
                .await?;
        }

        Ok(user.is_admin)
    }
}
