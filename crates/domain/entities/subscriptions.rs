use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::infra::db::postgres::schema::subscriptions;

/// Local mirror of a Stripe subscription, keyed by the Stripe subscription id.
///
/// Every upsert writes the full row; `treat_none_as_null` makes a cleared
/// optional timestamp overwrite the stored one instead of being skipped.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = subscriptions, treat_none_as_null = true)]
pub struct SubscriptionRecordEntity {
    pub id: String,
    pub user_id: String,
    pub metadata: Value,
    pub status: String,
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
}
