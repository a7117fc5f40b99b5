//! Maps: the root aggregate owning markers and collections.
//!
//! # Invariants
//! - `title` is non-blank after trim.
//! - Deleting a map removes its markers and collections (and their dependents).

use super::image::ImageId;
use super::patch::{nullable, present};
use super::user::UserId;
use super::{normalize_required, AccessLevel, ValidationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub type MapId = Uuid;

/// Base layer of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    /// OpenStreetMap tiles.
    Osm,
    /// User-uploaded image used as the map canvas.
    CustomImage,
}

impl MapType {
    /// Storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Osm => "osm",
            Self::CustomImage => "custom_image",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "osm" => Some(Self::Osm),
            "custom_image" => Some(Self::CustomImage),
            _ => None,
        }
    }
}

impl FromStr for MapType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim()).ok_or_else(|| ValidationError::UnknownValue {
            field: "map_type",
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub id: MapId,
    pub owner_id: UserId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MapType,
    pub image_id: Option<ImageId>,
    pub access_level: AccessLevel,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Creation input for a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMap {
    pub owner_id: UserId,
    pub title: String,
    pub kind: MapType,
    pub access_level: AccessLevel,
    pub image_id: Option<ImageId>,
}

impl NewMap {
    pub fn new(
        owner_id: UserId,
        title: &str,
        kind: MapType,
        access_level: AccessLevel,
        image_id: Option<ImageId>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            owner_id,
            title: normalize_required("title", title)?,
            kind,
            access_level,
            image_id,
        })
    }
}

/// Partial update for a map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapPatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "present")]
    pub kind: Option<MapType>,
    #[serde(default, deserialize_with = "present")]
    pub access_level: Option<AccessLevel>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_id: Option<Option<ImageId>>,
}

impl MapPatch {
    /// Applies provided fields onto `map`.
    pub fn apply(&self, map: &mut Map) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            map.title = normalize_required("title", title)?;
        }
        if let Some(kind) = self.kind {
            map.kind = kind;
        }
        if let Some(access_level) = self.access_level {
            map.access_level = access_level;
        }
        if let Some(image_id) = self.image_id {
            map.image_id = image_id;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.kind.is_none()
            && self.access_level.is_none()
            && self.image_id.is_none()
    }
}
