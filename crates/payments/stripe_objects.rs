//! Subsets of Stripe API objects that the reconciler reads.
//!
//! Only the fields we mirror are declared; everything else in the payload is
//! ignored so new Stripe API versions do not break deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::domain::value_objects::{
    enums::subscription_statuses::SubscriptionStatus, subscriptions::OWNING_USER_METADATA_KEY,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub api_version: Option<String>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

impl StripeEvent {
    /// Decodes `data.object` into one of the typed objects below.
    pub fn object_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data.object)
    }
}

/// A reference Stripe may send either as a bare id or as the expanded object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: SubscriptionStatus,
    pub customer: Option<Expandable>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub created: i64,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub ended_at: Option<i64>,
    pub cancel_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub trial_start: Option<i64>,
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: Option<StripePrice>,
    pub quantity: Option<i64>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

impl StripeSubscription {
    /// Newer API versions moved the billing period onto the items, so fall back
    /// to the first item when the top-level field is absent.
    pub fn period_start(&self) -> Option<i64> {
        self.current_period_start.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_start)
        })
    }

    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_end)
        })
    }

    pub fn price_id(&self) -> Option<&str> {
        self.items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.as_str())
    }

    pub fn quantity(&self) -> Option<i64> {
        self.items.data.first().and_then(|item| item.quantity)
    }

    /// The owning application user as recorded in metadata. Any non-blank value
    /// counts; the id format belongs to the application, not to Stripe.
    pub fn owning_user_id(&self) -> Option<&str> {
        self.metadata
            .get(OWNING_USER_METADATA_KEY)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeInvoice {
    pub id: Option<String>,
    pub subscription: Option<Expandable>,
    pub parent: Option<StripeInvoiceParent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeInvoiceParent {
    pub subscription_details: Option<StripeInvoiceSubscriptionDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeInvoiceSubscriptionDetails {
    pub subscription: Option<Expandable>,
}

impl StripeInvoice {
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_ref()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|parent| parent.subscription_details.as_ref())
                    .and_then(|details| details.subscription.as_ref())
            })
            .map(Expandable::id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: Option<String>,
    pub mode: Option<String>,
    pub customer: Option<Expandable>,
    pub subscription: Option<Expandable>,
    pub client_reference_id: Option<String>,
}

impl StripeCheckoutSession {
    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(Expandable::id)
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription.as_ref().map(Expandable::id)
    }

    pub fn client_reference_id(&self) -> Option<&str> {
        self.client_reference_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    pub fn is_subscription_mode(&self) -> bool {
        self.mode.as_deref() == Some("subscription")
    }
}
