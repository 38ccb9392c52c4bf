use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::comments::{CommentAuthorEntity, CommentWithAuthorEntity};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentModel {
    pub comment_text: Option<String>,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthorDto {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<CommentAuthorEntity> for CommentAuthorDto {
    fn from(value: CommentAuthorEntity) -> Self {
        Self {
            id: value.id,
            full_name: value.full_name,
            avatar_url: value.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDto {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub comment_text: String,
    pub parent_comment_id: Option<Uuid>,
    /// Keyed `profiles` to match what the editor frontend already consumes.
    #[serde(rename = "profiles")]
    pub author: Option<CommentAuthorDto>,
}

impl From<CommentWithAuthorEntity> for CommentDto {
    fn from(value: CommentWithAuthorEntity) -> Self {
        Self {
            id: value.comment.id,
            created_at: value.comment.created_at,
            comment_text: value.comment.comment_text,
            parent_comment_id: value.comment.parent_comment_id,
            author: value.author.map(CommentAuthorDto::from),
        }
    }
}
