use anyhow::{Result, bail};
use async_trait::async_trait;
use diesel::{RunQueryDsl, dsl::exists, insert_into, prelude::*, select, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::content},
};
use domain::{
    entities::content::{ContentSummaryEntity, InsertContentEntity, UpdateContentAnalysisEntity},
    repositories::content::ContentRepository,
};

pub struct ContentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ContentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ContentRepository for ContentPostgres {
    async fn list_by_user_id(&self, user_id: Uuid) -> Result<Vec<ContentSummaryEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = content::table
            .filter(content::user_id.eq(user_id))
            .order(content::created_at.desc())
            .select(ContentSummaryEntity::as_select())
            .load::<ContentSummaryEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create(&self, insert_content_entity: InsertContentEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(content::table)
            .values(&insert_content_entity)
            .returning(content::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn is_owned_by(&self, content_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let owned = select(exists(
            content::table
                .filter(content::id.eq(content_id))
                .filter(content::user_id.eq(user_id)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(owned)
    }

    async fn save_analysis(
        &self,
        content_id: Uuid,
        analysis: UpdateContentAnalysisEntity,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(content::table.filter(content::id.eq(content_id)))
            .set(&analysis)
            .execute(&mut conn)?;

        if updated == 0 {
            bail!("content {} not found while saving analysis", content_id);
        }

        Ok(())
    }
}
