//! Image repository contracts and SQLite implementation.
//!
//! Deleting an image leaves maps that used it in place with `image_id` null.

use super::schema::{
    ensure_connection_ready, ensure_exists, page_clause, parse_uuid, IMAGES, MAPS, USERS,
};
use super::{EntityKind, Page, RepoError, RepoResult};
use crate::model::image::{Image, ImageId, NewImage};
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const IMAGE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    mime_type,
    byte_size,
    payload,
    created_at
FROM images";

pub trait ImageRepository {
    fn create_image(&self, image: &NewImage) -> RepoResult<Image>;
    fn get_image(&self, id: ImageId) -> RepoResult<Option<Image>>;
    fn list_images_by_owner(&self, owner_id: UserId, page: Page) -> RepoResult<Vec<Image>>;
    fn delete_image(&self, id: ImageId) -> RepoResult<Image>;
}

/// SQLite-backed image repository.
pub struct SqliteImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteImageRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[&USERS, &IMAGES, &MAPS])?;
        Ok(Self { conn })
    }
}

impl ImageRepository for SqliteImageRepository<'_> {
    fn create_image(&self, image: &NewImage) -> RepoResult<Image> {
        ensure_exists(self.conn, EntityKind::User, image.owner_id)?;

        let id = Uuid::new_v4();
        let byte_size = i64::try_from(image.payload.len())
            .map_err(|_| RepoError::InvalidData("image payload too large".to_string()))?;
        self.conn.execute(
            "INSERT INTO images (id, owner_id, mime_type, byte_size, payload)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                image.owner_id.to_string(),
                image.mime_type.as_str(),
                byte_size,
                image.payload.as_slice(),
            ],
        )?;
        load_required_image(self.conn, id)
    }

    fn get_image(&self, id: ImageId) -> RepoResult<Option<Image>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IMAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_image_row(row)?));
        }
        Ok(None)
    }

    fn list_images_by_owner(&self, owner_id: UserId, page: Page) -> RepoResult<Vec<Image>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IMAGE_SELECT_SQL} WHERE owner_id = ?1 ORDER BY rowid ASC{};",
            page_clause(1)
        ))?;
        let mut rows = stmt.query(params![owner_id.to_string(), page.limit, page.offset])?;
        let mut images = Vec::new();
        while let Some(row) = rows.next()? {
            images.push(parse_image_row(row)?);
        }
        Ok(images)
    }

    fn delete_image(&self, id: ImageId) -> RepoResult<Image> {
        let image = load_required_image(self.conn, id)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE maps SET image_id = NULL WHERE image_id = ?1;",
            [id.to_string()],
        )?;
        tx.execute("DELETE FROM images WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;

        Ok(image)
    }
}

fn load_required_image(conn: &Connection, id: ImageId) -> RepoResult<Image> {
    let mut stmt = conn.prepare(&format!("{IMAGE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_image_row(row);
    }
    Err(RepoError::not_found(EntityKind::Image, id))
}

fn parse_image_row(row: &Row<'_>) -> RepoResult<Image> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    let byte_size: i64 = row.get("byte_size")?;
    Ok(Image {
        id: parse_uuid(&id_text, "images.id")?,
        owner_id: parse_uuid(&owner_text, "images.owner_id")?,
        mime_type: row.get("mime_type")?,
        byte_size: u64::try_from(byte_size).map_err(|_| {
            RepoError::InvalidData(format!("negative byte_size `{byte_size}` in images.byte_size"))
        })?,
        payload: row.get("payload")?,
        created_at: row.get("created_at")?,
    })
}
