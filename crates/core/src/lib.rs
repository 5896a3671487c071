//! Shopfront Core - Shared types library.
//!
//! This crate provides the types shared by the storefront client components:
//! - `client` - REST client, state store, cart service and login/registration flows
//! - `cli` - Command-line driver for the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Wire shapes follow the backend's JSON (camelCase fields, `_id` keys, 0/1
//! flags) so records can be mirrored into the local cache verbatim.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails and session tokens
//! - [`models`] - Cart, cart item, user and category records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
