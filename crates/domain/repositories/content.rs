use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::content::{
    ContentSummaryEntity, InsertContentEntity, UpdateContentAnalysisEntity,
};

#[automock]
#[async_trait]
pub trait ContentRepository {
    async fn list_by_user_id(&self, user_id: Uuid) -> Result<Vec<ContentSummaryEntity>>;

    async fn create(&self, insert_content_entity: InsertContentEntity) -> Result<Uuid>;

    async fn is_owned_by(&self, content_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn save_analysis(
        &self,
        content_id: Uuid,
        analysis: UpdateContentAnalysisEntity,
    ) -> Result<()>;
}
