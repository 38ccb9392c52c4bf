use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{comments, profiles},
    },
};
use domain::{
    entities::comments::{
        CommentAuthorEntity, CommentEntity, CommentWithAuthorEntity, InsertCommentEntity,
    },
    repositories::comments::CommentRepository,
};

pub struct CommentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CommentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CommentRepository for CommentPostgres {
    async fn list_by_content_id(&self, content_id: Uuid) -> Result<Vec<CommentWithAuthorEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = comments::table
            .left_join(profiles::table)
            .filter(comments::content_id.eq(content_id))
            .order(comments::created_at.asc())
            .select((
                CommentEntity::as_select(),
                Option::<CommentAuthorEntity>::as_select(),
            ))
            .load::<(CommentEntity, Option<CommentAuthorEntity>)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| CommentWithAuthorEntity { comment, author })
            .collect())
    }

    async fn create(
        &self,
        insert_comment_entity: InsertCommentEntity,
    ) -> Result<CommentWithAuthorEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let comment = insert_into(comments::table)
            .values(&insert_comment_entity)
            .returning(CommentEntity::as_returning())
            .get_result::<CommentEntity>(&mut conn)?;

        let author = profiles::table
            .filter(profiles::id.eq(comment.user_id))
            .select(CommentAuthorEntity::as_select())
            .first::<CommentAuthorEntity>(&mut conn)
            .optional()?;

        Ok(CommentWithAuthorEntity { comment, author })
    }
}
