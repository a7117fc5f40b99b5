//! Partial-update plumbing shared by patch types.
//!
//! Patches deserialize with `deny_unknown_fields`; nullable fields use a
//! three-state encoding: absent keeps the value, `null` clears it, anything
//! else replaces it. Non-nullable fields reject `null`.

use super::ValidationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Parses a JSON field-set into a typed patch.
///
/// # Errors
/// - `ValidationError::InvalidPatch` for unknown field names, non-object
///   payloads, or values outside the field's domain.
pub fn parse_patch<T: DeserializeOwned>(fields: serde_json::Value) -> Result<T, ValidationError> {
    if !fields.is_object() {
        return Err(ValidationError::InvalidPatch(
            "update payload must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(fields).map_err(|err| ValidationError::InvalidPatch(err.to_string()))
}

/// Deserializes a present field (including `null`) as `Some(..)`.
///
/// Pair with `#[serde(default)]` so an absent field stays `None`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserializes a present, non-null field as `Some(..)`.
///
/// Pair with `#[serde(default)]` so an absent field stays `None`; an explicit
/// `null` fails to deserialize instead of reading as "keep".
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
