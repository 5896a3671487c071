//! Shopfront client library.
//!
//! The client side of the storefront: a REST API port with a `reqwest`
//! adapter, a subscribable state store, a local cache mirroring cart state,
//! the cart/user/category services, and the login and registration flows.
//!
//! # Architecture
//!
//! Every operation is a short sequence: call the backend, write the local
//! cache, dispatch into the store, navigate. The cart service owns the cache
//! so the cache and the store always move together.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_client::{ClientConfig, Shopfront};
//!
//! let config = ClientConfig::from_env()?;
//! let shopfront = Shopfront::new(&config);
//!
//! let token = shopfront.users().login(&credentials).await?;
//! if let Some(cart) = shopfront.carts().fetch_cart_details(&token).await? {
//!     shopfront.carts().fetch_cart_items_by_cart_id(&cart.id, &token).await?;
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod flows;
pub mod services;
pub mod store;

pub use config::{ClientConfig, ConfigError};
pub use context::Shopfront;
pub use error::{ClientError, Result};
pub use store::{Action, AppState, Store};
