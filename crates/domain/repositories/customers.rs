use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::customers::CustomerLinkEntity;

#[automock]
#[async_trait]
pub trait CustomerLinkRepository {
    async fn find_stripe_customer_id(&self, user_id: &str) -> Result<Option<String>>;

    /// Inserts the link or replaces the customer id of an existing one.
    async fn upsert_customer_link(&self, link: CustomerLinkEntity) -> Result<()>;
}
