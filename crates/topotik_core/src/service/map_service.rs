//! Map use-case service.
//!
//! # Responsibility
//! - Provide map CRUD entry points for core callers.
//! - Parse loosely-typed update payloads into `MapPatch`.
//!
//! # Invariants
//! - Unknown update fields are rejected, never ignored.
//! - Deleting a map removes every marker, collection, article and block
//!   under it in one transaction.

use crate::model::image::ImageId;
use crate::model::map::{Map, MapId, MapPatch, MapType, NewMap};
use crate::model::patch::parse_patch;
use crate::model::user::UserId;
use crate::model::AccessLevel;
use crate::repo::map_repo::MapRepository;
use crate::repo::{Page, RepoResult};
use log::info;

/// Use-case service wrapper for map operations.
pub struct MapService<R: MapRepository> {
    repo: R,
}

impl<R: MapRepository> MapService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_map(
        &self,
        owner_id: UserId,
        title: &str,
        kind: MapType,
        access_level: AccessLevel,
        image_id: Option<ImageId>,
    ) -> RepoResult<Map> {
        let new_map = NewMap::new(owner_id, title, kind, access_level, image_id)?;
        let map = self.repo.create_map(&new_map)?;
        info!(
            "event=map_create module=service status=ok map_id={} access_level={}",
            map.id,
            map.access_level.as_str()
        );
        Ok(map)
    }

    pub fn get_map(&self, id: MapId) -> RepoResult<Option<Map>> {
        self.repo.get_map(id)
    }

    /// Lists maps in insertion order.
    pub fn list_maps(&self, page: Page) -> RepoResult<Vec<Map>> {
        self.repo.list_maps(page)
    }

    pub fn list_maps_by_owner(&self, owner_id: UserId, page: Page) -> RepoResult<Vec<Map>> {
        self.repo.list_maps_by_owner(owner_id, page)
    }

    pub fn update_map(&self, id: MapId, patch: &MapPatch) -> RepoResult<Map> {
        self.repo.update_map(id, patch)
    }

    /// Applies a JSON field-set such as `{"title": "..", "image_id": null}`.
    pub fn update_map_fields(&self, id: MapId, fields: serde_json::Value) -> RepoResult<Map> {
        let patch: MapPatch = parse_patch(fields)?;
        self.repo.update_map(id, &patch)
    }

    pub fn delete_map(&self, id: MapId) -> RepoResult<Map> {
        let map = self.repo.delete_map(id)?;
        info!("event=map_delete module=service status=ok map_id={id}");
        Ok(map)
    }
}
