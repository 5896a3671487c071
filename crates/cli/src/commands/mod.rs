//! Command implementations.

pub mod cart;
pub mod catalog;
pub mod session;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use shopfront_client::flows::{Navigator, Route};
use shopfront_client::{ClientError, ConfigError};
use shopfront_core::SessionToken;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to render output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not logged in: pass --token or set SHOPFRONT_TOKEN")]
    MissingToken,

    /// The backend refused the request with a message for the user.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid registration form: {0}")]
    InvalidForm(String),

    #[error("No open cart; run `shopfront cart create` first")]
    NoCart,

    /// A flow gave up and routed to the error view. Details are in the log.
    #[error("{0} failed")]
    Aborted(&'static str),
}

/// Navigator for a terminal session: there are no views, so the route is
/// only logged.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "Next view");
    }
}

/// Turn the `--token` value into a session token.
pub fn require_token(token: Option<&SecretString>) -> Result<SessionToken, CliError> {
    token
        .and_then(|raw| SessionToken::new(raw.expose_secret()))
        .ok_or(CliError::MissingToken)
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_token() {
        assert!(matches!(require_token(None), Err(CliError::MissingToken)));

        let blank = SecretString::from("  ");
        assert!(matches!(
            require_token(Some(&blank)),
            Err(CliError::MissingToken)
        ));

        let token = SecretString::from("abc.def");
        assert_eq!(require_token(Some(&token)).unwrap().expose(), "abc.def");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CliError::Rejected("Incorrect email or password".to_string()).to_string(),
            "Incorrect email or password"
        );
        assert_eq!(CliError::Aborted("Login").to_string(), "Login failed");
    }
}
