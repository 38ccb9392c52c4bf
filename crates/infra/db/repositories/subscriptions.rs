use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    entities::subscriptions::SubscriptionRecordEntity,
    repositories::subscriptions::SubscriptionRecordRepository,
};

pub struct SubscriptionRecordPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionRecordPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRecordRepository for SubscriptionRecordPostgres {
    async fn upsert_subscription(&self, record: SubscriptionRecordEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // ON CONFLICT keeps concurrent redeliveries of the same event atomic.
        insert_into(subscriptions::table)
            .values(&record)
            .on_conflict(subscriptions::id)
            .do_update()
            .set(&record)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn list_by_user_id(&self, user_id: &str) -> Result<Vec<SubscriptionRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let records = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .order(subscriptions::created.desc())
            .select(SubscriptionRecordEntity::as_select())
            .load::<SubscriptionRecordEntity>(&mut conn)?;

        Ok(records)
    }
}
