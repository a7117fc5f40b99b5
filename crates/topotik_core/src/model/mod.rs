//! Domain model for maps, markers, collections, articles and sharing.
//!
//! # Responsibility
//! - Define canonical records used by repositories and services.
//! - Own value validation so storage never sees out-of-domain values.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at creation.
//! - Enum values round-trip through their lowercase storage names.
//! - Child records always carry the id of an existing parent.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod article;
pub mod collection;
pub mod image;
pub mod map;
pub mod marker;
pub mod patch;
pub mod sharing;
pub mod user;

/// Caller supplied a field name or value outside the declared domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is blank after trim.
    EmptyField(&'static str),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Enum-typed field received an unknown value.
    UnknownValue { field: &'static str, value: String },
    /// Coordinate text is not a decimal with at most 6 fractional digits.
    InvalidCoordinate(String),
    /// Coordinate is outside the valid range for its axis.
    CoordinateOutOfRange { axis: &'static str, value: String },
    /// Patch payload has unknown fields or malformed values.
    InvalidPatch(String),
    /// Sharing row has no grantee, no token and is not public.
    ShareWithoutAudience,
    /// Image payload is empty.
    EmptyImage,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::UnknownValue { field, value } => {
                write!(f, "unknown value `{value}` for {field}")
            }
            Self::InvalidCoordinate(value) => write!(f, "invalid coordinate `{value}`"),
            Self::CoordinateOutOfRange { axis, value } => {
                write!(f, "{axis} `{value}` is out of range")
            }
            Self::InvalidPatch(message) => write!(f, "invalid update: {message}"),
            Self::ShareWithoutAudience => write!(
                f,
                "sharing needs a grantee, an access token or public visibility"
            ),
            Self::EmptyImage => write!(f, "image payload must not be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Visibility of a map or collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Visible to the owner and explicit grantees only.
    Private,
    /// Visible to holders of a sharing token.
    Link,
    /// Viewable by anyone.
    Public,
}

impl AccessLevel {
    /// Storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Link => "link",
            Self::Public => "public",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "private" => Some(Self::Private),
            "link" => Some(Self::Link),
            "public" => Some(Self::Public),
            _ => None,
        }
    }
}

impl FromStr for AccessLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim()).ok_or_else(|| ValidationError::UnknownValue {
            field: "access_level",
            value: value.to_string(),
        })
    }
}

/// Trims a required text field, rejecting blank input.
pub(crate) fn normalize_required(
    field: &'static str,
    value: &str,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank collapses to `None`.
pub(crate) fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{normalize_optional, normalize_required, AccessLevel, ValidationError};

    #[test]
    fn access_level_parses_storage_names() {
        assert_eq!("link".parse::<AccessLevel>().unwrap(), AccessLevel::Link);
        assert_eq!(AccessLevel::Public.as_str(), "public");
    }

    #[test]
    fn access_level_rejects_unknown_value() {
        let err = "secret".parse::<AccessLevel>().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownValue { field: "access_level", .. }
        ));
    }

    #[test]
    fn normalize_helpers_trim_and_reject_blank() {
        assert_eq!(normalize_required("title", "  Trip ").unwrap(), "Trip");
        assert_eq!(
            normalize_required("title", "   ").unwrap_err(),
            ValidationError::EmptyField("title")
        );
        assert_eq!(normalize_optional(Some("  ")), None);
        assert_eq!(normalize_optional(Some(" x ")).as_deref(), Some("x"));
    }
}
