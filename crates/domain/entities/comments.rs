use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{comments, profiles};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = comments)]
pub struct CommentEntity {
    pub id: Uuid,
    pub content_id: Uuid,
    pub user_id: Uuid,
    pub comment_text: String,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = comments)]
pub struct InsertCommentEntity {
    pub content_id: Uuid,
    pub user_id: Uuid,
    pub comment_text: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Selectable, Queryable)]
#[diesel(table_name = profiles)]
pub struct CommentAuthorEntity {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A comment joined with its author's profile; the profile is absent when the
/// author never completed onboarding.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentWithAuthorEntity {
    pub comment: CommentEntity,
    pub author: Option<CommentAuthorEntity>,
}
