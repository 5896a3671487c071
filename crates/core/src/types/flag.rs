//! Serde helpers for the backend's numeric boolean flags.
//!
//! The backend stores `isOpen` and `isAdmin` as `0`/`1`. Records are written
//! back to the local cache in the same shape, so these helpers serialize as
//! integers and accept either integers or JSON booleans.

use serde::{Deserialize, Deserializer, Serializer, de};

/// Serialize a `bool` as `0` or `1`.
///
/// # Errors
///
/// Propagates serializer errors.
#[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde
pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Deserialize `0`/`1`, `true`/`false`, or `null` (as `false`).
///
/// # Errors
///
/// Returns an error for any other number or type.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Bool(bool),
        Null(()),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(0) | Raw::Null(()) => Ok(false),
        Raw::Int(1) => Ok(true),
        Raw::Int(other) => Err(de::Error::custom(format!(
            "expected 0 or 1 for flag, got {other}"
        ))),
        Raw::Bool(b) => Ok(b),
    }
}
