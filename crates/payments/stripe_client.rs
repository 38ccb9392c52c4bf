use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

use super::stripe_objects::StripeSubscription;
use crate::domain::value_objects::subscriptions::OWNING_USER_METADATA_KEY;

/// Pinned so payload shapes do not drift with the account default.
pub const STRIPE_API_VERSION: &str = "2024-06-20";

/// Minimal Stripe client built on reqwest.
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base_url: Url,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

#[derive(Deserialize)]
struct IdResp {
    id: String,
}

#[derive(Deserialize)]
struct UrlResp {
    url: Option<String>,
}

impl StripeClient {
    pub fn new(
        secret_key: String,
        api_base_url: &str,
        success_url: String,
        cancel_url: String,
    ) -> Result<Self> {
        let api_base_url = Url::parse(api_base_url)
            .with_context(|| format!("invalid Stripe API base url: {api_base_url}"))?;

        Ok(Self {
            http: reqwest::Client::new(),
            secret_key,
            api_base_url,
            success_url,
            cancel_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_base_url
            .join(path)
            .with_context(|| format!("invalid Stripe endpoint path: {path}"))
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("Stripe-Version", STRIPE_API_VERSION)
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.as_deref()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.as_deref()),
            stripe_error_param = ?details.as_ref().and_then(|d| d.param.as_deref()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.as_deref()),
            context = %context,
            "stripe: api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// https://stripe.com/docs/api/customers/create
    pub async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String> {
        let body = [
            ("email".to_string(), email.to_string()),
            (
                format!("metadata[{}]", OWNING_USER_METADATA_KEY),
                user_id.to_string(),
            ),
        ];

        let resp = self
            .post(self.endpoint("v1/customers")?)
            .form(&body)
            .send()
            .await
            .context("create customer request failed")?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        let parsed: IdResp = resp.json().await?;
        info!(%user_id, stripe_customer_id = %parsed.id, "stripe: customer created");
        Ok(parsed.id)
    }

    /// Subscription-mode Checkout Session; returns the hosted page URL.
    /// https://stripe.com/docs/api/checkout/sessions/create
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_id: &str,
        user_id: Uuid,
    ) -> Result<String> {
        let body = [
            ("mode".to_string(), "subscription".to_string()),
            ("customer".to_string(), customer_id.to_string()),
            ("client_reference_id".to_string(), user_id.to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                format!("subscription_data[metadata][{}]", OWNING_USER_METADATA_KEY),
                user_id.to_string(),
            ),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        let resp = self
            .post(self.endpoint("v1/checkout/sessions")?)
            .form(&body)
            .send()
            .await
            .context("create checkout session request failed")?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        let parsed: UrlResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))
    }

    /// https://stripe.com/docs/api/customer_portal/sessions/create
    pub async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String> {
        let body = [("customer", customer_id), ("return_url", return_url)];

        let resp = self
            .post(self.endpoint("v1/billing_portal/sessions")?)
            .form(&body)
            .send()
            .await
            .context("create billing portal session request failed")?;
        let resp = Self::ensure_success(resp, "create billing portal session").await?;

        let parsed: UrlResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe billing portal session URL is missing"))
    }

    /// https://stripe.com/docs/api/subscriptions/retrieve
    pub async fn retrieve_subscription(&self, subscription_id: &str) -> Result<StripeSubscription> {
        let url = self.endpoint(&format!("v1/subscriptions/{}", subscription_id))?;

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header("Stripe-Version", STRIPE_API_VERSION)
            .send()
            .await
            .context("retrieve subscription request failed")?;
        let resp = Self::ensure_success(resp, "retrieve subscription").await?;

        let subscription: StripeSubscription = resp
            .json()
            .await
            .context("subscription response is not a valid subscription object")?;
        Ok(subscription)
    }
}
