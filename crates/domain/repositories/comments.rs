use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::comments::{CommentWithAuthorEntity, InsertCommentEntity};

#[automock]
#[async_trait]
pub trait CommentRepository {
    async fn list_by_content_id(&self, content_id: Uuid) -> Result<Vec<CommentWithAuthorEntity>>;

    async fn create(
        &self,
        insert_comment_entity: InsertCommentEntity,
    ) -> Result<CommentWithAuthorEntity>;
}
