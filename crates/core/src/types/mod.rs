//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod flag;
pub mod id;
pub mod token;

pub use email::{Email, EmailError};
pub use id::*;
pub use token::SessionToken;
