//! Sharing grants on maps and collections.
//!
//! # Invariants
//! - A row targets exactly one resource variant; there is no untyped
//!   (type, id) pair in the domain.
//! - A row has a grantee, an access token, or public visibility (or several).
//! - The target may disappear after the row is written; such rows resolve to
//!   "resource not found" rather than being deleted eagerly.

use super::collection::CollectionId;
use super::map::MapId;
use super::user::UserId;
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub type SharingId = Uuid;

/// Discriminant of a shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Map,
    Collection,
}

impl ResourceType {
    /// Storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Collection => "collection",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "map" => Some(Self::Map),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }
}

/// Reference to a shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "resource_type", content = "resource_id", rename_all = "snake_case")]
pub enum ResourceRef {
    Map(MapId),
    Collection(CollectionId),
}

impl ResourceRef {
    pub fn resource_type(self) -> ResourceType {
        match self {
            Self::Map(_) => ResourceType::Map,
            Self::Collection(_) => ResourceType::Collection,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Map(id) | Self::Collection(id) => id,
        }
    }

    pub fn from_parts(resource_type: ResourceType, id: Uuid) -> Self {
        match resource_type {
            ResourceType::Map => Self::Map(id),
            ResourceType::Collection => Self::Collection(id),
        }
    }
}

/// Granted or effective permission. `Edit` implies `View`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    View,
    Edit,
}

impl Permission {
    /// Storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "view" => Some(Self::View),
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }

    pub fn allows(self, required: Permission) -> bool {
        self >= required
    }
}

impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim()).ok_or_else(|| ValidationError::UnknownValue {
            field: "permission",
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sharing {
    pub id: SharingId,
    #[serde(flatten)]
    pub resource: ResourceRef,
    pub grantee_id: Option<UserId>,
    pub access_token: Option<String>,
    pub is_public: bool,
    pub permission: Permission,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSharing {
    pub resource: ResourceRef,
    pub grantee_id: Option<UserId>,
    pub access_token: Option<String>,
    pub is_public: bool,
    pub permission: Permission,
}

impl NewSharing {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_token = self
            .access_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty());
        if self.grantee_id.is_none() && !has_token && !self.is_public {
            return Err(ValidationError::ShareWithoutAudience);
        }
        if self.access_token.is_some() && !has_token {
            return Err(ValidationError::EmptyField("access_token"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NewSharing, Permission, ResourceRef};
    use crate::model::ValidationError;
    use uuid::Uuid;

    fn share(grantee: bool, token: Option<&str>, public: bool) -> NewSharing {
        NewSharing {
            resource: ResourceRef::Map(Uuid::new_v4()),
            grantee_id: grantee.then(Uuid::new_v4),
            access_token: token.map(str::to_string),
            is_public: public,
            permission: Permission::View,
        }
    }

    #[test]
    fn sharing_needs_some_audience() {
        assert_eq!(
            share(false, None, false).validate(),
            Err(ValidationError::ShareWithoutAudience)
        );
        assert!(share(true, None, false).validate().is_ok());
        assert!(share(false, Some("tok"), false).validate().is_ok());
        assert!(share(false, None, true).validate().is_ok());
    }

    #[test]
    fn blank_token_is_rejected() {
        assert_eq!(
            share(true, Some("  "), false).validate(),
            Err(ValidationError::EmptyField("access_token"))
        );
    }

    #[test]
    fn edit_allows_view_but_not_reverse() {
        assert!(Permission::Edit.allows(Permission::View));
        assert!(!Permission::View.allows(Permission::Edit));
    }

    #[test]
    fn resource_ref_exposes_type_and_id() {
        let id = Uuid::new_v4();
        let resource = ResourceRef::Collection(id);
        assert_eq!(resource.resource_type().as_str(), "collection");
        assert_eq!(resource.id(), id);
    }
}
