//! Article and block repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist articles attached to markers.
//! - Persist ordered content blocks attached to articles.
//!
//! # Invariants
//! - Block listings are ordered by `order ASC`, ties by insertion order.
//! - Deleting an article removes all of its blocks.

use super::cascade::delete_article_tree;
use super::schema::{
    ensure_connection_ready, ensure_exists, invalid_enum, page_clause, parse_uuid, ARTICLES,
    BLOCKS, MARKERS,
};
use super::{EntityKind, Page, RepoError, RepoResult};
use crate::model::article::{
    Article, ArticleId, Block, BlockId, BlockPatch, BlockType, NewBlock,
};
use crate::model::marker::MarkerId;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const BLOCK_SELECT_SQL: &str = "SELECT
    id,
    article_id,
    block_type,
    content,
    sort_order,
    created_at
FROM blocks";

pub trait ArticleRepository {
    fn create_article(&self, marker_id: MarkerId) -> RepoResult<Article>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    fn list_articles_by_marker(&self, marker_id: MarkerId, page: Page)
        -> RepoResult<Vec<Article>>;
    fn delete_article(&self, id: ArticleId) -> RepoResult<Article>;

    fn append_block(&self, block: &NewBlock) -> RepoResult<Block>;
    fn get_block(&self, id: BlockId) -> RepoResult<Option<Block>>;
    fn list_blocks(&self, article_id: ArticleId, page: Page) -> RepoResult<Vec<Block>>;
    fn update_block(&self, id: BlockId, patch: &BlockPatch) -> RepoResult<Block>;
    fn delete_block(&self, id: BlockId) -> RepoResult<Block>;
}

/// SQLite-backed article/block repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[&MARKERS, &ARTICLES, &BLOCKS])?;
        Ok(Self { conn })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_article(&self, marker_id: MarkerId) -> RepoResult<Article> {
        ensure_exists(self.conn, EntityKind::Marker, marker_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO articles (id, marker_id) VALUES (?1, ?2);",
            params![id.to_string(), marker_id.to_string()],
        )?;
        load_required_article(self.conn, id)
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        self.conn
            .query_row(
                "SELECT id, marker_id, created_at FROM articles WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(parse_article_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_articles_by_marker(
        &self,
        marker_id: MarkerId,
        page: Page,
    ) -> RepoResult<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, marker_id, created_at
             FROM articles
             WHERE marker_id = ?1
             ORDER BY rowid ASC{};",
            page_clause(1)
        ))?;
        let mut rows = stmt.query(params![marker_id.to_string(), page.limit, page.offset])?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }
        Ok(articles)
    }

    fn delete_article(&self, id: ArticleId) -> RepoResult<Article> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let article = load_required_article(&tx, id)?;
        delete_article_tree(&tx, id)?;
        tx.commit()?;
        Ok(article)
    }

    fn append_block(&self, block: &NewBlock) -> RepoResult<Block> {
        ensure_exists(self.conn, EntityKind::Article, block.article_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO blocks (id, article_id, block_type, content, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                block.article_id.to_string(),
                block.kind.as_str(),
                block.content.as_str(),
                block.order,
            ],
        )?;
        load_required_block(self.conn, id)
    }

    fn get_block(&self, id: BlockId) -> RepoResult<Option<Block>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BLOCK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_block_row(row)?));
        }
        Ok(None)
    }

    fn list_blocks(&self, article_id: ArticleId, page: Page) -> RepoResult<Vec<Block>> {
        ensure_exists(self.conn, EntityKind::Article, article_id)?;

        let mut stmt = self.conn.prepare(&format!(
            "{BLOCK_SELECT_SQL}
             WHERE article_id = ?1
             ORDER BY sort_order ASC, rowid ASC{};",
            page_clause(1)
        ))?;
        let mut rows = stmt.query(params![article_id.to_string(), page.limit, page.offset])?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next()? {
            blocks.push(parse_block_row(row)?);
        }
        Ok(blocks)
    }

    fn update_block(&self, id: BlockId, patch: &BlockPatch) -> RepoResult<Block> {
        let mut block = load_required_block(self.conn, id)?;
        patch.apply(&mut block);

        self.conn.execute(
            "UPDATE blocks
             SET block_type = ?2,
                 content = ?3,
                 sort_order = ?4
             WHERE id = ?1;",
            params![
                id.to_string(),
                block.kind.as_str(),
                block.content.as_str(),
                block.order,
            ],
        )?;
        load_required_block(self.conn, id)
    }

    fn delete_block(&self, id: BlockId) -> RepoResult<Block> {
        let block = load_required_block(self.conn, id)?;
        self.conn
            .execute("DELETE FROM blocks WHERE id = ?1;", [id.to_string()])?;
        Ok(block)
    }
}

pub(crate) fn load_required_article(conn: &Connection, id: ArticleId) -> RepoResult<Article> {
    conn.query_row(
        "SELECT id, marker_id, created_at FROM articles WHERE id = ?1;",
        [id.to_string()],
        |row| Ok(parse_article_row(row)),
    )
    .optional()?
    .unwrap_or_else(|| Err(RepoError::not_found(EntityKind::Article, id)))
}

fn load_required_block(conn: &Connection, id: BlockId) -> RepoResult<Block> {
    let mut stmt = conn.prepare(&format!("{BLOCK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_block_row(row);
    }
    Err(RepoError::not_found(EntityKind::Block, id))
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let id_text: String = row.get(0)?;
    let marker_text: String = row.get(1)?;
    Ok(Article {
        id: parse_uuid(&id_text, "articles.id")?,
        marker_id: parse_uuid(&marker_text, "articles.marker_id")?,
        created_at: row.get(2)?,
    })
}

fn parse_block_row(row: &Row<'_>) -> RepoResult<Block> {
    let id_text: String = row.get("id")?;
    let article_text: String = row.get("article_id")?;
    let kind_text: String = row.get("block_type")?;
    let kind = BlockType::parse(&kind_text)
        .ok_or_else(|| invalid_enum(&kind_text, "blocks.block_type"))?;

    Ok(Block {
        id: parse_uuid(&id_text, "blocks.id")?,
        article_id: parse_uuid(&article_text, "blocks.article_id")?,
        kind,
        content: row.get("content")?,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
    })
}
