//! Login and registration flows.
//!
//! A flow drives the services for one form and decides where the user goes
//! next. Navigation is a [`Route`] handed to an injected [`Navigator`];
//! expected rejections are shown through a [`FlashMessage`] that clears
//! itself after a delay.
//!
//! # Error routing
//!
//! - Login: HTTP 401 shows the server message for 4.5 s, no navigation
//! - Registration: HTTP 400 shows the server message for 3 s, no navigation
//! - Anything else: [`Route::Error`]

mod flash;
pub mod listener;
pub mod login;
pub mod register;

pub use flash::FlashMessage;
pub use listener::TokenListener;
pub use login::{LoginFlow, LoginForm};
pub use register::{FieldError, RegisterFlow, RegistrationField, RegistrationForm};

use std::sync::Mutex;
use std::time::Duration;

/// How long a rejected login message stays visible.
pub const LOGIN_ERROR_DISPLAY: Duration = Duration::from_millis(4500);

/// How long a rejected registration message stays visible.
pub const REGISTER_ERROR_DISPLAY: Duration = Duration::from_millis(3000);

/// Navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Shopping,
    Home,
    Error,
}

impl Route {
    /// Path of the view.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Shopping => "/shopping",
            Self::Home => "/home",
            Self::Error => "/error",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives navigation requests from flows.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that records every route, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes navigated to so far.
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.lock().clone()
    }

    /// Most recent route.
    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.lock().last().copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Route>> {
        self.routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "Navigating");
        self.lock().push(route);
    }
}

/// Result of submitting a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The flow navigated (including to [`Route::Error`]).
    Navigated(Route),
    /// Success without navigation; the form view stays.
    Stayed,
    /// Expected rejection; the message is being flashed.
    Rejected(String),
}
