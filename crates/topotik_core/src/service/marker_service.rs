//! Marker use-case service.

use crate::model::map::MapId;
use crate::model::marker::{GeoPoint, Marker, MarkerId, MarkerPatch, NewMarker};
use crate::model::patch::parse_patch;
use crate::repo::marker_repo::MarkerRepository;
use crate::repo::{Page, RepoResult};
use log::info;

pub struct MarkerService<R: MarkerRepository> {
    repo: R,
}

impl<R: MarkerRepository> MarkerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_marker(
        &self,
        map_id: MapId,
        position: GeoPoint,
        title: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<Marker> {
        self.repo
            .create_marker(&NewMarker::new(map_id, position, title, description))
    }

    pub fn get_marker(&self, id: MarkerId) -> RepoResult<Option<Marker>> {
        self.repo.get_marker(id)
    }

    pub fn list_markers_by_map(&self, map_id: MapId, page: Page) -> RepoResult<Vec<Marker>> {
        self.repo.list_markers_by_map(map_id, page)
    }

    pub fn update_marker(&self, id: MarkerId, patch: &MarkerPatch) -> RepoResult<Marker> {
        self.repo.update_marker(id, patch)
    }

    /// Applies a JSON field-set; coordinates may be decimal strings or numbers.
    pub fn update_marker_fields(
        &self,
        id: MarkerId,
        fields: serde_json::Value,
    ) -> RepoResult<Marker> {
        let patch: MarkerPatch = parse_patch(fields)?;
        self.repo.update_marker(id, &patch)
    }

    /// Deletes a marker with its articles, blocks and collection links.
    pub fn delete_marker(&self, id: MarkerId) -> RepoResult<Marker> {
        let marker = self.repo.delete_marker(id)?;
        info!("event=marker_delete module=service status=ok marker_id={id}");
        Ok(marker)
    }
}
