//! Map repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `maps` with skip/take listing in insertion order.
//! - Delete a map together with everything it owns in one transaction.
//!
//! # Invariants
//! - `owner_id` references an existing user; `image_id`, when set, an
//!   existing image.
//! - After `delete_map` no marker, collection, article, block or link row
//!   references the map.

use super::cascade::delete_map_tree;
use super::schema::{
    ensure_connection_ready, ensure_exists, invalid_enum, page_clause, parse_optional_uuid,
    parse_uuid, ARTICLES, BLOCKS, COLLECTIONS, IMAGES, MAPS, MARKERS, MARKER_COLLECTIONS, USERS,
};
use super::{EntityKind, Page, RepoError, RepoResult};
use crate::model::image::ImageId;
use crate::model::map::{Map, MapId, MapPatch, MapType, NewMap};
use crate::model::user::UserId;
use crate::model::AccessLevel;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const MAP_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    map_type,
    image_id,
    access_level,
    created_at
FROM maps";

pub trait MapRepository {
    fn create_map(&self, map: &NewMap) -> RepoResult<Map>;
    fn get_map(&self, id: MapId) -> RepoResult<Option<Map>>;
    fn list_maps(&self, page: Page) -> RepoResult<Vec<Map>>;
    fn list_maps_by_owner(&self, owner_id: UserId, page: Page) -> RepoResult<Vec<Map>>;
    fn update_map(&self, id: MapId, patch: &MapPatch) -> RepoResult<Map>;
    /// Deletes the map and cascades to its markers and collections.
    fn delete_map(&self, id: MapId) -> RepoResult<Map>;
}

/// SQLite-backed map repository.
pub struct SqliteMapRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMapRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                &USERS,
                &IMAGES,
                &MAPS,
                &MARKERS,
                &COLLECTIONS,
                &MARKER_COLLECTIONS,
                &ARTICLES,
                &BLOCKS,
            ],
        )?;
        Ok(Self { conn })
    }
}

impl MapRepository for SqliteMapRepository<'_> {
    fn create_map(&self, map: &NewMap) -> RepoResult<Map> {
        ensure_exists(self.conn, EntityKind::User, map.owner_id)?;
        ensure_image_exists(self.conn, map.image_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO maps (id, owner_id, title, map_type, image_id, access_level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                map.owner_id.to_string(),
                map.title.as_str(),
                map.kind.as_str(),
                map.image_id.map(|value| value.to_string()),
                map.access_level.as_str(),
            ],
        )?;
        load_required_map(self.conn, id)
    }

    fn get_map(&self, id: MapId) -> RepoResult<Option<Map>> {
        let mut stmt = self.conn.prepare(&format!("{MAP_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_map_row(row)?));
        }
        Ok(None)
    }

    fn list_maps(&self, page: Page) -> RepoResult<Vec<Map>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MAP_SELECT_SQL} ORDER BY rowid ASC{};",
            page_clause(0)
        ))?;
        let mut rows = stmt.query(params![page.limit, page.offset])?;
        let mut maps = Vec::new();
        while let Some(row) = rows.next()? {
            maps.push(parse_map_row(row)?);
        }
        Ok(maps)
    }

    fn list_maps_by_owner(&self, owner_id: UserId, page: Page) -> RepoResult<Vec<Map>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MAP_SELECT_SQL} WHERE owner_id = ?1 ORDER BY rowid ASC{};",
            page_clause(1)
        ))?;
        let mut rows = stmt.query(params![owner_id.to_string(), page.limit, page.offset])?;
        let mut maps = Vec::new();
        while let Some(row) = rows.next()? {
            maps.push(parse_map_row(row)?);
        }
        Ok(maps)
    }

    fn update_map(&self, id: MapId, patch: &MapPatch) -> RepoResult<Map> {
        let mut map = load_required_map(self.conn, id)?;
        patch.apply(&mut map)?;
        if patch.image_id.is_some() {
            ensure_image_exists(self.conn, map.image_id)?;
        }

        self.conn.execute(
            "UPDATE maps
             SET
                title = ?2,
                map_type = ?3,
                image_id = ?4,
                access_level = ?5
             WHERE id = ?1;",
            params![
                id.to_string(),
                map.title.as_str(),
                map.kind.as_str(),
                map.image_id.map(|value| value.to_string()),
                map.access_level.as_str(),
            ],
        )?;
        load_required_map(self.conn, id)
    }

    fn delete_map(&self, id: MapId) -> RepoResult<Map> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let map = load_required_map(&tx, id)?;
        delete_map_tree(&tx, id)?;
        tx.commit()?;
        Ok(map)
    }
}

fn ensure_image_exists(conn: &Connection, image_id: Option<ImageId>) -> RepoResult<()> {
    match image_id {
        Some(image_id) => ensure_exists(conn, EntityKind::Image, image_id),
        None => Ok(()),
    }
}

pub(crate) fn load_required_map(conn: &Connection, id: MapId) -> RepoResult<Map> {
    let mut stmt = conn.prepare(&format!("{MAP_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_map_row(row);
    }
    Err(RepoError::not_found(EntityKind::Map, id))
}

fn parse_map_row(row: &Row<'_>) -> RepoResult<Map> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;

    let type_text: String = row.get("map_type")?;
    let kind = MapType::parse(&type_text).ok_or_else(|| invalid_enum(&type_text, "maps.map_type"))?;

    let level_text: String = row.get("access_level")?;
    let access_level = AccessLevel::parse(&level_text)
        .ok_or_else(|| invalid_enum(&level_text, "maps.access_level"))?;

    Ok(Map {
        id: parse_uuid(&id_text, "maps.id")?,
        owner_id: parse_uuid(&owner_text, "maps.owner_id")?,
        title: row.get("title")?,
        kind,
        image_id: parse_optional_uuid(row.get("image_id")?, "maps.image_id")?,
        access_level,
        created_at: row.get("created_at")?,
    })
}
