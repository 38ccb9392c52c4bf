use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, upsert::excluded};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::customers},
};
use domain::{
    entities::customers::CustomerLinkEntity,
    repositories::customers::CustomerLinkRepository,
};

pub struct CustomerLinkPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CustomerLinkPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CustomerLinkRepository for CustomerLinkPostgres {
    async fn find_stripe_customer_id(&self, user_id: &str) -> Result<Option<String>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let stripe_customer_id = customers::table
            .filter(customers::id.eq(user_id))
            .select(customers::stripe_customer_id)
            .first::<String>(&mut conn)
            .optional()?;

        Ok(stripe_customer_id)
    }

    async fn upsert_customer_link(&self, link: CustomerLinkEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(customers::table)
            .values(&link)
            .on_conflict(customers::id)
            .do_update()
            .set(customers::stripe_customer_id.eq(excluded(customers::stripe_customer_id)))
            .execute(&mut conn)?;

        Ok(())
    }
}
