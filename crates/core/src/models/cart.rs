//! Shopping cart and cart item records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::flag;
use crate::{CartId, CartItemId, ProductId, UserId};

/// A shopping cart.
///
/// A user has at most one open cart. It is created on the first shopping
/// action, closed on checkout and dropped from client state on logout.
///
/// Serializes back to the exact document the backend sent: `createdAt` is
/// kept as received and fields this model does not name are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id")]
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: Option<String>,
    #[serde(with = "flag", default)]
    pub is_open: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cart {
    /// The record cached when the backend reports that the user has no cart.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            id: CartId::default(),
            user_id: UserId::default(),
            created_at: None,
            is_open: false,
            extra: Map::new(),
        }
    }

    /// Creation time, if the backend sent a parseable RFC 3339 timestamp.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Whether this is the [`Cart::placeholder`] record.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }

    /// Copy of this cart with the open flag cleared.
    #[must_use]
    pub fn closed(&self) -> Self {
        Self {
            is_open: false,
            ..self.clone()
        }
    }
}

/// A line in a cart: a product reference and a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for `POST /cart-items/add-cart-item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItem {
    pub cart_id: CartId,
    pub product: ProductId,
    pub quantity: u32,
}
