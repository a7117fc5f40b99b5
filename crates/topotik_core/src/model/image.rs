//! Uploaded image blobs owned by users.

use super::user::UserId;
use super::{normalize_required, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ImageId = Uuid;

/// Stored image with its raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub owner_id: UserId,
    pub mime_type: String,
    pub byte_size: u64,
    #[serde(skip)]
    pub payload: Vec<u8>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Upload input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub owner_id: UserId,
    pub mime_type: String,
    pub payload: Vec<u8>,
}

impl NewImage {
    pub fn new(
        owner_id: UserId,
        mime_type: &str,
        payload: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let mime_type = normalize_required("mime_type", mime_type)?.to_ascii_lowercase();
        if payload.is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        Ok(Self {
            owner_id,
            mime_type,
            payload,
        })
    }
}
