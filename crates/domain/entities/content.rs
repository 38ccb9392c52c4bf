use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::infra::db::postgres::schema::content;

/// Listing projection; the editor body and analysis blobs stay in the database.
#[derive(Debug, Clone, Selectable, Queryable)]
#[diesel(table_name = content)]
pub struct ContentSummaryEntity {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub status: String,
    pub scheduled_publish_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = content)]
pub struct InsertContentEntity {
    pub user_id: Uuid,
    pub title: String,
    pub body: Value,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = content)]
pub struct UpdateContentAnalysisEntity {
    pub seo_analysis: Option<Value>,
    pub readability_analysis: Option<Value>,
    pub engagement_analysis: Option<Value>,
    pub updated_at: DateTime<Utc>,
}
