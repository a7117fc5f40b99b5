//! Collection use-case service.
//!
//! # Invariants
//! - Adding an existing marker link or removing a missing one succeeds
//!   without changes.
//! - Collection deletion never deletes markers.

use crate::model::collection::{Collection, CollectionId, CollectionPatch, NewCollection};
use crate::model::map::MapId;
use crate::model::marker::{Marker, MarkerId};
use crate::model::patch::parse_patch;
use crate::model::user::UserId;
use crate::model::AccessLevel;
use crate::repo::collection_repo::CollectionRepository;
use crate::repo::{Page, RepoResult};
use log::debug;

pub struct CollectionService<R: CollectionRepository> {
    repo: R,
}

impl<R: CollectionRepository> CollectionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_collection(
        &self,
        map_id: MapId,
        owner_id: UserId,
        title: &str,
        access_level: AccessLevel,
    ) -> RepoResult<Collection> {
        let collection = NewCollection::new(map_id, owner_id, title, access_level)?;
        self.repo.create_collection(&collection)
    }

    pub fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>> {
        self.repo.get_collection(id)
    }

    pub fn list_collections(&self, page: Page) -> RepoResult<Vec<Collection>> {
        self.repo.list_collections(page)
    }

    pub fn list_collections_by_map(&self, map_id: MapId) -> RepoResult<Vec<Collection>> {
        self.repo.list_collections_by_map(map_id)
    }

    pub fn update_collection(
        &self,
        id: CollectionId,
        patch: &CollectionPatch,
    ) -> RepoResult<Collection> {
        self.repo.update_collection(id, patch)
    }

    pub fn update_collection_fields(
        &self,
        id: CollectionId,
        fields: serde_json::Value,
    ) -> RepoResult<Collection> {
        let patch: CollectionPatch = parse_patch(fields)?;
        self.repo.update_collection(id, &patch)
    }

    pub fn delete_collection(&self, id: CollectionId) -> RepoResult<Collection> {
        self.repo.delete_collection(id)
    }

    /// Links a marker; linking twice is a no-op.
    pub fn add_marker_to_collection(
        &self,
        marker_id: MarkerId,
        collection_id: CollectionId,
    ) -> RepoResult<()> {
        let inserted = self.repo.add_marker(marker_id, collection_id)?;
        debug!(
            "event=collection_link module=service status=ok collection_id={collection_id} changed={inserted}"
        );
        Ok(())
    }

    /// Unlinks a marker; unlinking a missing pair is a no-op.
    pub fn remove_marker_from_collection(
        &self,
        marker_id: MarkerId,
        collection_id: CollectionId,
    ) -> RepoResult<()> {
        let removed = self.repo.remove_marker(marker_id, collection_id)?;
        debug!(
            "event=collection_unlink module=service status=ok collection_id={collection_id} changed={removed}"
        );
        Ok(())
    }

    /// Markers of a collection in link order.
    pub fn list_markers_in_collection(
        &self,
        collection_id: CollectionId,
    ) -> RepoResult<Vec<Marker>> {
        self.repo.list_markers(collection_id)
    }

    pub fn list_collections_for_marker(&self, marker_id: MarkerId) -> RepoResult<Vec<Collection>> {
        self.repo.list_collections_for_marker(marker_id)
    }
}
