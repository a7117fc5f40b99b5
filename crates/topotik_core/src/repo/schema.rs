//! Shared SQLite helpers for repositories: schema readiness checks, id
//! parsing and parent existence probes.

use super::{EntityKind, RepoError, RepoResult};
use crate::db::migrations::latest_version;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

/// Table plus the columns a repository reads or writes.
pub(crate) struct RequiredTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub(crate) const USERS: RequiredTable = RequiredTable {
    name: "users",
    columns: &["id", "username", "email", "password_hash", "created_at"],
};

pub(crate) const IMAGES: RequiredTable = RequiredTable {
    name: "images",
    columns: &["id", "owner_id", "mime_type", "byte_size", "payload", "created_at"],
};

pub(crate) const MAPS: RequiredTable = RequiredTable {
    name: "maps",
    columns: &[
        "id",
        "owner_id",
        "title",
        "map_type",
        "image_id",
        "access_level",
        "created_at",
    ],
};

pub(crate) const COLLECTIONS: RequiredTable = RequiredTable {
    name: "collections",
    columns: &["id", "map_id", "owner_id", "title", "access_level", "created_at"],
};

pub(crate) const MARKERS: RequiredTable = RequiredTable {
    name: "markers",
    columns: &[
        "id",
        "map_id",
        "latitude_e6",
        "longitude_e6",
        "title",
        "description",
        "created_at",
    ],
};

pub(crate) const MARKER_COLLECTIONS: RequiredTable = RequiredTable {
    name: "marker_collections",
    columns: &["marker_id", "collection_id"],
};

pub(crate) const ARTICLES: RequiredTable = RequiredTable {
    name: "articles",
    columns: &["id", "marker_id", "created_at"],
};

pub(crate) const BLOCKS: RequiredTable = RequiredTable {
    name: "blocks",
    columns: &[
        "id",
        "article_id",
        "block_type",
        "content",
        "sort_order",
        "created_at",
    ],
};

pub(crate) const SHARINGS: RequiredTable = RequiredTable {
    name: "sharings",
    columns: &[
        "id",
        "resource_type",
        "resource_id",
        "grantee_id",
        "access_token",
        "is_public",
        "permission",
        "created_at",
    ],
};

/// Rejects connections that are not migrated or miss required tables/columns.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&RequiredTable],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        for &column in table.columns {
            if !table_has_column(conn, table.name, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: table.name,
                    column,
                });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn invalid_enum(value: &str, column: &'static str) -> RepoError {
    RepoError::InvalidData(format!("invalid value `{value}` in {column}"))
}

fn table_for(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::User => USERS.name,
        EntityKind::Image => IMAGES.name,
        EntityKind::Map => MAPS.name,
        EntityKind::Marker => MARKERS.name,
        EntityKind::Collection => COLLECTIONS.name,
        EntityKind::Article => ARTICLES.name,
        EntityKind::Block => BLOCKS.name,
        EntityKind::Sharing => SHARINGS.name,
    }
}

/// Returns `NotFound` unless a row with `id` exists for `entity`.
pub(crate) fn ensure_exists(conn: &Connection, entity: EntityKind, id: Uuid) -> RepoResult<()> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1;", table_for(entity)),
            [id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    match found {
        Some(()) => Ok(()),
        None => Err(RepoError::not_found(entity, id)),
    }
}

/// Appends `LIMIT/OFFSET` placeholders numbered after `bound` existing params.
pub(crate) fn page_clause(bound: usize) -> String {
    format!(" LIMIT ?{} OFFSET ?{}", bound + 1, bound + 2)
}
