//! Login, registration and logout.
//!
//! # Usage
//!
//! ```bash
//! # Log in and keep the printed token for later commands
//! export SHOPFRONT_TOKEN=$(shopfront login -e customer@shop.test -p secret)
//!
//! # Create an account
//! shopfront register --id-num 123456789 -e new@shop.test -p pw --confirm-password pw \
//!     --city Haifa --street "Herzl 1" --first-name Dana --last-name Levi
//!
//! # Drop the cached cart state
//! shopfront logout
//! ```

use std::sync::Arc;

use shopfront_client::Shopfront;
use shopfront_client::flows::{LoginForm, RegistrationForm, Route, SubmitOutcome};
use tracing::{info, warn};

use super::{CliError, TerminalNavigator};

/// Log in and print the session token.
pub async fn login(shopfront: &Shopfront, email: String, password: String) -> Result<(), CliError> {
    let flow = shopfront.login_flow(Arc::new(TerminalNavigator));
    let mut form = LoginForm { email, password };

    match flow.submit(&mut form).await {
        SubmitOutcome::Navigated(Route::Error) => return Err(CliError::Aborted("Login")),
        SubmitOutcome::Rejected(message) => return Err(CliError::Rejected(message)),
        SubmitOutcome::Navigated(_) | SubmitOutcome::Stayed => {}
    }

    let state = shopfront.store().snapshot();
    if let Some(user) = &state.user_details {
        info!(
            user = %user.email,
            is_admin = user.is_admin,
            open_cart = state.cart_details.as_ref().is_some_and(|cart| cart.is_open),
            items = state.cart_items.len(),
            "Logged in"
        );
    }
    print_token(shopfront)
}

/// Register a new account and print its session token.
pub async fn register(shopfront: &Shopfront, form: RegistrationForm) -> Result<(), CliError> {
    shopfront.users().fetch_cities().await?;

    let mut flow = shopfront.register_flow(Arc::new(TerminalNavigator));
    flow.init();
    if !flow.cities().is_empty() && !flow.cities().contains(&form.city) {
        warn!(city = %form.city, "City is not in the offered list");
    }
    flow.form = form;

    if flow.is_submit_disabled() {
        return Err(CliError::InvalidForm(describe_invalid(&flow.form)));
    }

    match flow.submit().await {
        SubmitOutcome::Navigated(Route::Error) => return Err(CliError::Aborted("Registration")),
        SubmitOutcome::Rejected(message) => return Err(CliError::Rejected(message)),
        SubmitOutcome::Navigated(_) | SubmitOutcome::Stayed => {}
    }

    info!(categories = shopfront.store().select(|s| s.categories.len()), "Registered");
    print_token(shopfront)
}

/// Clear the session and the cached cart.
pub async fn logout(shopfront: &Shopfront) -> Result<(), CliError> {
    shopfront.users().logout().await?;
    println!("Logged out");
    Ok(())
}

fn print_token(shopfront: &Shopfront) -> Result<(), CliError> {
    let token = shopfront.store().token().ok_or(CliError::MissingToken)?;
    println!("{}", token.expose());
    Ok(())
}

fn describe_invalid(form: &RegistrationForm) -> String {
    let mut problems: Vec<String> = form
        .invalid_fields()
        .into_iter()
        .map(|(field, error)| format!("{}: {error}", field.name()))
        .collect();
    if !form.passwords_match() {
        problems.push("confirmPassword: passwords do not match".to_string());
    }
    problems.join("; ")
}
