use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::entities::content::ContentSummaryEntity;

pub const MAX_TITLE_LENGTH: usize = 255;

/// Empty document in the rich-text editor's JSON format.
pub fn empty_editor_document() -> Value {
    json!({ "type": "doc", "content": [] })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentModel {
    pub title: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedContentDto {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentSummaryDto {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub status: String,
    pub scheduled_publish_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<ContentSummaryEntity> for ContentSummaryDto {
    fn from(value: ContentSummaryEntity) -> Self {
        Self {
            id: value.id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            title: value.title,
            status: value.status,
            scheduled_publish_at: value.scheduled_publish_at,
            published_at: value.published_at,
        }
    }
}
