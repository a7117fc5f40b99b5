//! Collection repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `collections`.
//! - Own the marker/collection association (`marker_collections`).
//!
//! # Invariants
//! - Adding an existing link and removing a missing link are no-ops.
//! - Deleting a collection removes its links only; markers survive.

use super::cascade::delete_collection_tree;
use super::marker_repo::{parse_marker_row, MARKER_SELECT_SQL};
use super::schema::{
    ensure_connection_ready, ensure_exists, invalid_enum, page_clause, parse_uuid, COLLECTIONS,
    MAPS, MARKERS, MARKER_COLLECTIONS, USERS,
};
use super::{EntityKind, Page, RepoError, RepoResult};
use crate::model::collection::{Collection, CollectionId, CollectionPatch, NewCollection};
use crate::model::map::MapId;
use crate::model::marker::{Marker, MarkerId};
use crate::model::AccessLevel;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const COLLECTION_SELECT_SQL: &str = "SELECT
    collections.id AS id,
    collections.map_id AS map_id,
    collections.owner_id AS owner_id,
    collections.title AS title,
    collections.access_level AS access_level,
    collections.created_at AS created_at
FROM collections";

pub trait CollectionRepository {
    fn create_collection(&self, collection: &NewCollection) -> RepoResult<Collection>;
    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>>;
    fn list_collections(&self, page: Page) -> RepoResult<Vec<Collection>>;
    fn list_collections_by_map(&self, map_id: MapId) -> RepoResult<Vec<Collection>>;
    fn update_collection(
        &self,
        id: CollectionId,
        patch: &CollectionPatch,
    ) -> RepoResult<Collection>;
    fn delete_collection(&self, id: CollectionId) -> RepoResult<Collection>;
    /// Links a marker to a collection. Returns `false` when already linked.
    fn add_marker(&self, marker_id: MarkerId, collection_id: CollectionId) -> RepoResult<bool>;
    /// Unlinks a marker. Returns `false` when there was no link.
    fn remove_marker(&self, marker_id: MarkerId, collection_id: CollectionId)
        -> RepoResult<bool>;
    fn list_markers(&self, collection_id: CollectionId) -> RepoResult<Vec<Marker>>;
    fn list_collections_for_marker(&self, marker_id: MarkerId) -> RepoResult<Vec<Collection>>;
}

/// SQLite-backed collection repository.
pub struct SqliteCollectionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCollectionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[&USERS, &MAPS, &MARKERS, &COLLECTIONS, &MARKER_COLLECTIONS],
        )?;
        Ok(Self { conn })
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn create_collection(&self, collection: &NewCollection) -> RepoResult<Collection> {
        ensure_exists(self.conn, EntityKind::Map, collection.map_id)?;
        ensure_exists(self.conn, EntityKind::User, collection.owner_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO collections (id, map_id, owner_id, title, access_level)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                collection.map_id.to_string(),
                collection.owner_id.to_string(),
                collection.title.as_str(),
                collection.access_level.as_str(),
            ],
        )?;
        load_required_collection(self.conn, id)
    }

    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COLLECTION_SELECT_SQL} WHERE collections.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_collection_row(row)?));
        }
        Ok(None)
    }

    fn list_collections(&self, page: Page) -> RepoResult<Vec<Collection>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLLECTION_SELECT_SQL} ORDER BY collections.rowid ASC{};",
            page_clause(0)
        ))?;
        let mut rows = stmt.query(params![page.limit, page.offset])?;
        collect_collections(&mut rows)
    }

    fn list_collections_by_map(&self, map_id: MapId) -> RepoResult<Vec<Collection>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLLECTION_SELECT_SQL} WHERE collections.map_id = ?1 ORDER BY collections.rowid ASC;"
        ))?;
        let mut rows = stmt.query([map_id.to_string()])?;
        collect_collections(&mut rows)
    }

    fn update_collection(
        &self,
        id: CollectionId,
        patch: &CollectionPatch,
    ) -> RepoResult<Collection> {
        let mut collection = load_required_collection(self.conn, id)?;
        patch.apply(&mut collection)?;

        self.conn.execute(
            "UPDATE collections
             SET title = ?2,
                 access_level = ?3
             WHERE id = ?1;",
            params![
                id.to_string(),
                collection.title.as_str(),
                collection.access_level.as_str(),
            ],
        )?;
        load_required_collection(self.conn, id)
    }

    fn delete_collection(&self, id: CollectionId) -> RepoResult<Collection> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let collection = load_required_collection(&tx, id)?;
        delete_collection_tree(&tx, id)?;
        tx.commit()?;
        Ok(collection)
    }

    fn add_marker(&self, marker_id: MarkerId, collection_id: CollectionId) -> RepoResult<bool> {
        ensure_exists(self.conn, EntityKind::Marker, marker_id)?;
        ensure_exists(self.conn, EntityKind::Collection, collection_id)?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO marker_collections (marker_id, collection_id)
             VALUES (?1, ?2);",
            params![marker_id.to_string(), collection_id.to_string()],
        )?;
        Ok(inserted == 1)
    }

    fn remove_marker(
        &self,
        marker_id: MarkerId,
        collection_id: CollectionId,
    ) -> RepoResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM marker_collections
             WHERE marker_id = ?1
               AND collection_id = ?2;",
            params![marker_id.to_string(), collection_id.to_string()],
        )?;
        Ok(removed == 1)
    }

    fn list_markers(&self, collection_id: CollectionId) -> RepoResult<Vec<Marker>> {
        ensure_exists(self.conn, EntityKind::Collection, collection_id)?;

        let mut stmt = self.conn.prepare(&format!(
            "{MARKER_SELECT_SQL}
             INNER JOIN marker_collections mc ON mc.marker_id = markers.id
             WHERE mc.collection_id = ?1
             ORDER BY mc.rowid ASC;"
        ))?;
        let mut rows = stmt.query([collection_id.to_string()])?;
        let mut markers = Vec::new();
        while let Some(row) = rows.next()? {
            markers.push(parse_marker_row(row)?);
        }
        Ok(markers)
    }

    fn list_collections_for_marker(&self, marker_id: MarkerId) -> RepoResult<Vec<Collection>> {
        ensure_exists(self.conn, EntityKind::Marker, marker_id)?;

        let mut stmt = self.conn.prepare(&format!(
            "{COLLECTION_SELECT_SQL}
             INNER JOIN marker_collections mc ON mc.collection_id = collections.id
             WHERE mc.marker_id = ?1
             ORDER BY mc.rowid ASC;"
        ))?;
        let mut rows = stmt.query([marker_id.to_string()])?;
        collect_collections(&mut rows)
    }
}

fn collect_collections(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Collection>> {
    let mut collections = Vec::new();
    while let Some(row) = rows.next()? {
        collections.push(parse_collection_row(row)?);
    }
    Ok(collections)
}

pub(crate) fn load_required_collection(
    conn: &Connection,
    id: CollectionId,
) -> RepoResult<Collection> {
    let mut stmt = conn.prepare(&format!("{COLLECTION_SELECT_SQL} WHERE collections.id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_collection_row(row);
    }
    Err(RepoError::not_found(EntityKind::Collection, id))
}

fn parse_collection_row(row: &Row<'_>) -> RepoResult<Collection> {
    let id_text: String = row.get("id")?;
    let map_text: String = row.get("map_id")?;
    let owner_text: String = row.get("owner_id")?;
    let level_text: String = row.get("access_level")?;
    let access_level = AccessLevel::parse(&level_text)
        .ok_or_else(|| invalid_enum(&level_text, "collections.access_level"))?;

    Ok(Collection {
        id: parse_uuid(&id_text, "collections.id")?,
        map_id: parse_uuid(&map_text, "collections.map_id")?,
        owner_id: parse_uuid(&owner_text, "collections.owner_id")?,
        title: row.get("title")?,
        access_level,
        created_at: row.get("created_at")?,
    })
}
