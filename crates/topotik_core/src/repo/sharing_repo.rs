//! Sharing repository contracts and SQLite implementation.
//!
//! # Invariants
//! - The target resource and grantee must exist when a row is written.
//! - Access tokens are unique across all rows.
//! - Rows are not removed when their resource is deleted.

use super::schema::{
    ensure_connection_ready, ensure_exists, invalid_enum, parse_optional_uuid, parse_uuid,
    COLLECTIONS, MAPS, SHARINGS, USERS,
};
use super::{EntityKind, RepoError, RepoResult};
use crate::model::sharing::{
    NewSharing, Permission, ResourceRef, ResourceType, Sharing, SharingId,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub(crate) const SHARING_SELECT_SQL: &str = "SELECT
    id,
    resource_type,
    resource_id,
    grantee_id,
    access_token,
    is_public,
    permission,
    created_at
FROM sharings";

pub trait SharingRepository {
    fn create_sharing(&self, sharing: &NewSharing) -> RepoResult<Sharing>;
    fn get_sharing(&self, id: SharingId) -> RepoResult<Option<Sharing>>;
    fn list_sharings(&self, resource: ResourceRef) -> RepoResult<Vec<Sharing>>;
    fn delete_sharing(&self, id: SharingId) -> RepoResult<Sharing>;
}

/// SQLite-backed sharing repository.
pub struct SqliteSharingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSharingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[&USERS, &MAPS, &COLLECTIONS, &SHARINGS])?;
        Ok(Self { conn })
    }
}

impl SharingRepository for SqliteSharingRepository<'_> {
    fn create_sharing(&self, sharing: &NewSharing) -> RepoResult<Sharing> {
        sharing.validate()?;
        ensure_exists(self.conn, resource_entity(sharing.resource), sharing.resource.id())?;
        if let Some(grantee_id) = sharing.grantee_id {
            ensure_exists(self.conn, EntityKind::User, grantee_id)?;
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO sharings (
                id, resource_type, resource_id, grantee_id, access_token, is_public, permission
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                sharing.resource.resource_type().as_str(),
                sharing.resource.id().to_string(),
                sharing.grantee_id.map(|grantee| grantee.to_string()),
                sharing.access_token.as_deref().map(str::trim),
                sharing.is_public,
                sharing.permission.as_str(),
            ],
        )?;
        load_required_sharing(self.conn, id)
    }

    fn get_sharing(&self, id: SharingId) -> RepoResult<Option<Sharing>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SHARING_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sharing_row(row)?));
        }
        Ok(None)
    }

    fn list_sharings(&self, resource: ResourceRef) -> RepoResult<Vec<Sharing>> {
        list_sharings_for(self.conn, resource)
    }

    fn delete_sharing(&self, id: SharingId) -> RepoResult<Sharing> {
        let sharing = load_required_sharing(self.conn, id)?;
        self.conn
            .execute("DELETE FROM sharings WHERE id = ?1;", [id.to_string()])?;
        Ok(sharing)
    }
}

fn resource_entity(resource: ResourceRef) -> EntityKind {
    match resource {
        ResourceRef::Map(_) => EntityKind::Map,
        ResourceRef::Collection(_) => EntityKind::Collection,
    }
}

pub(crate) fn list_sharings_for(
    conn: &Connection,
    resource: ResourceRef,
) -> RepoResult<Vec<Sharing>> {
    let mut stmt = conn.prepare(&format!(
        "{SHARING_SELECT_SQL}
         WHERE resource_type = ?1
           AND resource_id = ?2
         ORDER BY rowid ASC;"
    ))?;
    let mut rows = stmt.query(params![
        resource.resource_type().as_str(),
        resource.id().to_string()
    ])?;
    let mut sharings = Vec::new();
    while let Some(row) = rows.next()? {
        sharings.push(parse_sharing_row(row)?);
    }
    Ok(sharings)
}

fn load_required_sharing(conn: &Connection, id: SharingId) -> RepoResult<Sharing> {
    let mut stmt = conn.prepare(&format!("{SHARING_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_sharing_row(row);
    }
    Err(RepoError::not_found(EntityKind::Sharing, id))
}

fn parse_sharing_row(row: &Row<'_>) -> RepoResult<Sharing> {
    let id_text: String = row.get("id")?;
    let type_text: String = row.get("resource_type")?;
    let resource_text: String = row.get("resource_id")?;
    let permission_text: String = row.get("permission")?;

    let resource_type = ResourceType::parse(&type_text)
        .ok_or_else(|| invalid_enum(&type_text, "sharings.resource_type"))?;
    let permission = Permission::parse(&permission_text)
        .ok_or_else(|| invalid_enum(&permission_text, "sharings.permission"))?;

    Ok(Sharing {
        id: parse_uuid(&id_text, "sharings.id")?,
        resource: ResourceRef::from_parts(
            resource_type,
            parse_uuid(&resource_text, "sharings.resource_id")?,
        ),
        grantee_id: parse_optional_uuid(row.get("grantee_id")?, "sharings.grantee_id")?,
        access_token: row.get("access_token")?,
        is_public: row.get("is_public")?,
        permission,
        created_at: row.get("created_at")?,
    })
}
