use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::subscriptions::SubscriptionRecordEntity;

#[automock]
#[async_trait]
pub trait SubscriptionRecordRepository {
    /// Single-statement insert-or-replace keyed by the Stripe subscription id.
    async fn upsert_subscription(&self, record: SubscriptionRecordEntity) -> Result<()>;

    async fn list_by_user_id(&self, user_id: &str) -> Result<Vec<SubscriptionRecordEntity>>;
}
