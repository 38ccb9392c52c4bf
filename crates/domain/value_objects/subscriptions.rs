use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::SubscriptionRecordEntity,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

/// Metadata key carrying the owning application user on Stripe customers and
/// subscriptions.
pub const OWNING_USER_METADATA_KEY: &str = "supabaseUserId";

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRecordDto {
    pub id: String,
    pub status: SubscriptionStatus,
    /// Whether the status currently grants paid access.
    pub entitled: bool,
    pub price_id: Option<String>,
    pub quantity: Option<i32>,
    pub cancel_at_period_end: bool,
    pub created: DateTime<Utc>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cancel_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub metadata: Value,
}

impl From<SubscriptionRecordEntity> for SubscriptionRecordDto {
    fn from(value: SubscriptionRecordEntity) -> Self {
        let status = SubscriptionStatus::from_str(&value.status);

        Self {
            entitled: status.is_entitled(),
            status,
            id: value.id,
            price_id: value.price_id,
            quantity: value.quantity,
            cancel_at_period_end: value.cancel_at_period_end,
            created: value.created,
            current_period_start: value.current_period_start,
            current_period_end: value.current_period_end,
            ended_at: value.ended_at,
            cancel_at: value.cancel_at,
            canceled_at: value.canceled_at,
            trial_start: value.trial_start,
            trial_end: value.trial_end,
            metadata: value.metadata,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalSessionModel {
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSessionModel {
    pub price_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillingRedirectDto {
    pub url: String,
}

/// Identity of the caller as far as billing needs it.
#[derive(Debug, Clone)]
pub struct BillingCustomer {
    pub user_id: Uuid,
    pub email: Option<String>,
}
