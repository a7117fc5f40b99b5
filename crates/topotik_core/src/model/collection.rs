//! Collections group markers of one map (many-to-many).

use super::map::MapId;
use super::patch::present;
use super::user::UserId;
use super::{normalize_required, AccessLevel, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CollectionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub map_id: MapId,
    pub owner_id: UserId,
    pub title: String,
    pub access_level: AccessLevel,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCollection {
    pub map_id: MapId,
    pub owner_id: UserId,
    pub title: String,
    pub access_level: AccessLevel,
}

impl NewCollection {
    pub fn new(
        map_id: MapId,
        owner_id: UserId,
        title: &str,
        access_level: AccessLevel,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            map_id,
            owner_id,
            title: normalize_required("title", title)?,
            access_level,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionPatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub access_level: Option<AccessLevel>,
}

impl CollectionPatch {
    pub fn apply(&self, collection: &mut Collection) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            collection.title = normalize_required("title", title)?;
        }
        if let Some(access_level) = self.access_level {
            collection.access_level = access_level;
        }
        Ok(())
    }
}
