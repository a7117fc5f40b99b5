//! Article and block use-case service.
//!
//! # Invariants
//! - `list_blocks` returns blocks by `order ASC`, ties in creation order.

use crate::model::article::{Article, ArticleId, Block, BlockId, BlockPatch, BlockType, NewBlock};
use crate::model::marker::MarkerId;
use crate::model::patch::parse_patch;
use crate::repo::article_repo::ArticleRepository;
use crate::repo::{Page, RepoResult};

pub struct ArticleService<R: ArticleRepository> {
    repo: R,
}

impl<R: ArticleRepository> ArticleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_article(&self, marker_id: MarkerId) -> RepoResult<Article> {
        self.repo.create_article(marker_id)
    }

    pub fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        self.repo.get_article(id)
    }

    pub fn list_articles_by_marker(
        &self,
        marker_id: MarkerId,
        page: Page,
    ) -> RepoResult<Vec<Article>> {
        self.repo.list_articles_by_marker(marker_id, page)
    }

    /// Deletes an article and all of its blocks.
    pub fn delete_article(&self, id: ArticleId) -> RepoResult<Article> {
        self.repo.delete_article(id)
    }

    pub fn append_block(
        &self,
        article_id: ArticleId,
        kind: BlockType,
        content: impl Into<String>,
        order: i64,
    ) -> RepoResult<Block> {
        self.repo
            .append_block(&NewBlock::new(article_id, kind, content, order))
    }

    pub fn get_block(&self, id: BlockId) -> RepoResult<Option<Block>> {
        self.repo.get_block(id)
    }

    pub fn list_blocks(&self, article_id: ArticleId, page: Page) -> RepoResult<Vec<Block>> {
        self.repo.list_blocks(article_id, page)
    }

    pub fn update_block(&self, id: BlockId, patch: &BlockPatch) -> RepoResult<Block> {
        self.repo.update_block(id, patch)
    }

    pub fn update_block_fields(&self, id: BlockId, fields: serde_json::Value) -> RepoResult<Block> {
        let patch: BlockPatch = parse_patch(fields)?;
        self.repo.update_block(id, &patch)
    }

    pub fn delete_block(&self, id: BlockId) -> RepoResult<Block> {
        self.repo.delete_block(id)
    }
}
