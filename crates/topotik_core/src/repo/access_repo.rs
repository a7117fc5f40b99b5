//! Read-only lookups backing access resolution.
//!
//! # Responsibility
//! - Resolve a shareable resource to its owner and visibility.
//! - Walk markers, articles and blocks up to their owning map.
//! - Load the sharing rows attached to one resource.
//!
//! # Invariants
//! - Lookups never write.
//! - A missing row is reported as `None`, never as an error, so the caller
//!   can tell "resource not found" apart from "access denied".

use super::schema::{
    ensure_connection_ready, invalid_enum, parse_uuid, ARTICLES, BLOCKS, COLLECTIONS, MAPS,
    MARKERS, SHARINGS,
};
use super::sharing_repo::list_sharings_for;
use super::RepoResult;
use crate::model::article::{ArticleId, BlockId};
use crate::model::map::MapId;
use crate::model::marker::MarkerId;
use crate::model::sharing::{ResourceRef, Sharing};
use crate::model::user::UserId;
use crate::model::AccessLevel;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

/// Ownership and visibility of one shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceFacts {
    pub resource: ResourceRef,
    pub owner_id: UserId,
    pub access_level: AccessLevel,
}

pub trait AccessRepository {
    fn resource_facts(&self, resource: ResourceRef) -> RepoResult<Option<ResourceFacts>>;
    fn map_of_marker(&self, marker_id: MarkerId) -> RepoResult<Option<MapId>>;
    fn map_of_article(&self, article_id: ArticleId) -> RepoResult<Option<MapId>>;
    fn map_of_block(&self, block_id: BlockId) -> RepoResult<Option<MapId>>;
    fn sharings_for(&self, resource: ResourceRef) -> RepoResult<Vec<Sharing>>;
}

/// SQLite-backed access lookups.
pub struct SqliteAccessRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccessRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[&MAPS, &COLLECTIONS, &MARKERS, &ARTICLES, &BLOCKS, &SHARINGS],
        )?;
        Ok(Self { conn })
    }

    fn lookup_map_id(&self, sql: &str, id: Uuid, column: &'static str) -> RepoResult<Option<MapId>> {
        let map_text: Option<String> = self
            .conn
            .query_row(sql, [id.to_string()], |row| row.get(0))
            .optional()?;
        map_text
            .map(|text| parse_uuid(&text, column))
            .transpose()
    }
}

impl AccessRepository for SqliteAccessRepository<'_> {
    fn resource_facts(&self, resource: ResourceRef) -> RepoResult<Option<ResourceFacts>> {
        let sql = match resource {
            ResourceRef::Map(_) => "SELECT owner_id, access_level FROM maps WHERE id = ?1;",
            ResourceRef::Collection(_) => {
                "SELECT owner_id, access_level FROM collections WHERE id = ?1;"
            }
        };
        let row: Option<(String, String)> = self
            .conn
            .query_row(sql, [resource.id().to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let Some((owner_text, level_text)) = row else {
            return Ok(None);
        };
        let access_level = AccessLevel::parse(&level_text)
            .ok_or_else(|| invalid_enum(&level_text, "access_level"))?;
        Ok(Some(ResourceFacts {
            resource,
            owner_id: parse_uuid(&owner_text, "owner_id")?,
            access_level,
        }))
    }

    fn map_of_marker(&self, marker_id: MarkerId) -> RepoResult<Option<MapId>> {
        self.lookup_map_id(
            "SELECT map_id FROM markers WHERE id = ?1;",
            marker_id,
            "markers.map_id",
        )
    }

    fn map_of_article(&self, article_id: ArticleId) -> RepoResult<Option<MapId>> {
        self.lookup_map_id(
            "SELECT m.map_id
             FROM articles a
             INNER JOIN markers m ON m.id = a.marker_id
             WHERE a.id = ?1;",
            article_id,
            "markers.map_id",
        )
    }

    fn map_of_block(&self, block_id: BlockId) -> RepoResult<Option<MapId>> {
        self.lookup_map_id(
            "SELECT m.map_id
             FROM blocks b
             INNER JOIN articles a ON a.id = b.article_id
             INNER JOIN markers m ON m.id = a.marker_id
             WHERE b.id = ?1;",
            block_id,
            "markers.map_id",
        )
    }

    fn sharings_for(&self, resource: ResourceRef) -> RepoResult<Vec<Sharing>> {
        list_sharings_for(self.conn, resource)
    }
}
