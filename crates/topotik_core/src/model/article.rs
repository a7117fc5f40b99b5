//! Articles and their ordered content blocks.
//!
//! # Invariants
//! - Block `order` is scoped to one article; values may repeat or skip.
//! - Display order is `order ASC`, ties broken by creation order.

use super::marker::MarkerId;
use super::patch::present;
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub type ArticleId = Uuid;
pub type BlockId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub marker_id: MarkerId,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Payload kind of a block. The content format depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Image,
    Video,
    Link,
}

impl BlockType {
    /// Storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Link => "link",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "link" => Some(Self::Link),
            _ => None,
        }
    }
}

impl FromStr for BlockType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim()).ok_or_else(|| ValidationError::UnknownValue {
            field: "block_type",
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub article_id: ArticleId,
    #[serde(rename = "type")]
    pub kind: BlockType,
    /// Opaque payload; interpretation depends on `kind`.
    pub content: String,
    pub order: i64,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlock {
    pub article_id: ArticleId,
    pub kind: BlockType,
    pub content: String,
    pub order: i64,
}

impl NewBlock {
    pub fn new(article_id: ArticleId, kind: BlockType, content: impl Into<String>, order: i64) -> Self {
        Self {
            article_id,
            kind,
            content: content.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockPatch {
    #[serde(default, rename = "type", deserialize_with = "present")]
    pub kind: Option<BlockType>,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub order: Option<i64>,
}

impl BlockPatch {
    pub fn apply(&self, block: &mut Block) {
        if let Some(kind) = self.kind {
            block.kind = kind;
        }
        if let Some(content) = &self.content {
            block.content = content.clone();
        }
        if let Some(order) = self.order {
            block.order = order;
        }
    }
}
