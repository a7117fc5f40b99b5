//! Marker repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Markers always belong to an existing map.
//! - Deleting a marker removes its articles, their blocks and its collection
//!   links, never the collections themselves.

use super::cascade::delete_marker_tree;
use super::schema::{
    ensure_connection_ready, ensure_exists, page_clause, parse_uuid, ARTICLES, BLOCKS, MAPS,
    MARKERS, MARKER_COLLECTIONS,
};
use super::{EntityKind, Page, RepoError, RepoResult};
use crate::model::map::MapId;
use crate::model::marker::{Coordinate, GeoPoint, Marker, MarkerId, MarkerPatch, NewMarker};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

pub(crate) const MARKER_SELECT_SQL: &str = "SELECT
    markers.id AS id,
    markers.map_id AS map_id,
    markers.latitude_e6 AS latitude_e6,
    markers.longitude_e6 AS longitude_e6,
    markers.title AS title,
    markers.description AS description,
    markers.created_at AS created_at
FROM markers";

pub trait MarkerRepository {
    fn create_marker(&self, marker: &NewMarker) -> RepoResult<Marker>;
    fn get_marker(&self, id: MarkerId) -> RepoResult<Option<Marker>>;
    fn list_markers_by_map(&self, map_id: MapId, page: Page) -> RepoResult<Vec<Marker>>;
    fn update_marker(&self, id: MarkerId, patch: &MarkerPatch) -> RepoResult<Marker>;
    fn delete_marker(&self, id: MarkerId) -> RepoResult<Marker>;
}

/// SQLite-backed marker repository.
pub struct SqliteMarkerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMarkerRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[&MAPS, &MARKERS, &MARKER_COLLECTIONS, &ARTICLES, &BLOCKS],
        )?;
        Ok(Self { conn })
    }
}

impl MarkerRepository for SqliteMarkerRepository<'_> {
    fn create_marker(&self, marker: &NewMarker) -> RepoResult<Marker> {
        ensure_exists(self.conn, EntityKind::Map, marker.map_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO markers (id, map_id, latitude_e6, longitude_e6, title, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                marker.map_id.to_string(),
                marker.position.latitude().micro_degrees(),
                marker.position.longitude().micro_degrees(),
                marker.title.as_deref(),
                marker.description.as_deref(),
            ],
        )?;
        load_required_marker(self.conn, id)
    }

    fn get_marker(&self, id: MarkerId) -> RepoResult<Option<Marker>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MARKER_SELECT_SQL} WHERE markers.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_marker_row(row)?));
        }
        Ok(None)
    }

    fn list_markers_by_map(&self, map_id: MapId, page: Page) -> RepoResult<Vec<Marker>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MARKER_SELECT_SQL} WHERE markers.map_id = ?1 ORDER BY markers.rowid ASC{};",
            page_clause(1)
        ))?;
        let mut rows = stmt.query(params![map_id.to_string(), page.limit, page.offset])?;
        let mut markers = Vec::new();
        while let Some(row) = rows.next()? {
            markers.push(parse_marker_row(row)?);
        }
        Ok(markers)
    }

    fn update_marker(&self, id: MarkerId, patch: &MarkerPatch) -> RepoResult<Marker> {
        let mut marker = load_required_marker(self.conn, id)?;
        patch.apply(&mut marker)?;

        self.conn.execute(
            "UPDATE markers
             SET
                latitude_e6 = ?2,
                longitude_e6 = ?3,
                title = ?4,
                description = ?5
             WHERE id = ?1;",
            params![
                id.to_string(),
                marker.position.latitude().micro_degrees(),
                marker.position.longitude().micro_degrees(),
                marker.title.as_deref(),
                marker.description.as_deref(),
            ],
        )?;
        load_required_marker(self.conn, id)
    }

    fn delete_marker(&self, id: MarkerId) -> RepoResult<Marker> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let marker = load_required_marker(&tx, id)?;
        delete_marker_tree(&tx, id)?;
        tx.commit()?;
        Ok(marker)
    }
}

pub(crate) fn load_required_marker(conn: &Connection, id: MarkerId) -> RepoResult<Marker> {
    let mut stmt = conn.prepare(&format!("{MARKER_SELECT_SQL} WHERE markers.id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_marker_row(row);
    }
    Err(RepoError::not_found(EntityKind::Marker, id))
}

pub(crate) fn parse_marker_row(row: &Row<'_>) -> RepoResult<Marker> {
    let id_text: String = row.get("id")?;
    let map_text: String = row.get("map_id")?;
    let position = GeoPoint::new(
        Coordinate::from_micro_degrees(row.get("latitude_e6")?),
        Coordinate::from_micro_degrees(row.get("longitude_e6")?),
    )
    .map_err(|err| RepoError::InvalidData(format!("invalid marker position: {err}")))?;

    Ok(Marker {
        id: parse_uuid(&id_text, "markers.id")?,
        map_id: parse_uuid(&map_text, "markers.map_id")?,
        position,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}
