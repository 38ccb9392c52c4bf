use std::{fmt, sync::Arc};

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use copyforge_core::{
    domain::{
        entities::{customers::CustomerLinkEntity, subscriptions::SubscriptionRecordEntity},
        repositories::{
            customers::CustomerLinkRepository, subscriptions::SubscriptionRecordRepository,
        },
        value_objects::subscriptions::OWNING_USER_METADATA_KEY,
    },
    payments::{
        stripe_objects::{StripeCheckoutSession, StripeEvent, StripeInvoice, StripeSubscription},
        webhook_verifier::{VerificationError, WebhookVerifier},
    },
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{error, info, warn};

use super::stripe_gateway::StripeGateway;

#[derive(Debug, Error)]
pub enum StripeWebhookError {
    #[error("webhook configuration missing: {0}")]
    ConfigurationMissing(&'static str),
    #[error("webhook signature invalid: {0}")]
    SignatureInvalid(&'static str),
    #[error("webhook payload is not a valid event: {0}")]
    InvalidPayload(String),
    #[error("failed to fetch subscription from Stripe: {0}")]
    UpstreamFetchFailed(anyhow::Error),
    #[error("failed to write reconciled state: {0}")]
    StoreWriteFailed(anyhow::Error),
    #[error("malformed Stripe object: {0}")]
    MalformedObject(String),
}

impl From<VerificationError> for StripeWebhookError {
    fn from(value: VerificationError) -> Self {
        match value {
            VerificationError::ConfigurationMissing(what) => Self::ConfigurationMissing(what),
            VerificationError::SignatureInvalid(why) => Self::SignatureInvalid(why),
            VerificationError::InvalidPayload(why) => Self::InvalidPayload(why),
        }
    }
}

impl StripeWebhookError {
    /// 400s are terminal for the sender; 500s make Stripe redeliver.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StripeWebhookError::ConfigurationMissing(_)
            | StripeWebhookError::SignatureInvalid(_)
            | StripeWebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            StripeWebhookError::UpstreamFetchFailed(_)
            | StripeWebhookError::StoreWriteFailed(_)
            | StripeWebhookError::MalformedObject(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short reason shown in the Stripe dashboard; never carries internals.
    pub fn client_message(&self) -> &'static str {
        match self {
            StripeWebhookError::ConfigurationMissing(_) => "webhook secret or signature missing",
            StripeWebhookError::SignatureInvalid(_) => "webhook signature verification failed",
            StripeWebhookError::InvalidPayload(_) => "webhook payload could not be parsed",
            StripeWebhookError::UpstreamFetchFailed(_) => "failed to fetch subscription",
            StripeWebhookError::StoreWriteFailed(_) => "failed to store reconciled state",
            StripeWebhookError::MalformedObject(_) => "malformed Stripe object",
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, StripeWebhookError>;

/// Conditions that are logged and alerted on but still acknowledge the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAnomaly {
    OwningUserUnresolvable {
        subscription_id: String,
    },
    CheckoutMissingSubscription {
        session_id: Option<String>,
    },
}

impl WebhookAnomaly {
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookAnomaly::OwningUserUnresolvable { .. } => "owning_user_unresolvable",
            WebhookAnomaly::CheckoutMissingSubscription { .. } => "checkout_missing_subscription",
        }
    }
}

impl fmt::Display for WebhookAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookAnomaly::OwningUserUnresolvable { subscription_id } => write!(
                f,
                "subscription {subscription_id} has no {OWNING_USER_METADATA_KEY} in its metadata"
            ),
            WebhookAnomaly::CheckoutMissingSubscription { session_id } => write!(
                f,
                "subscription-mode checkout session {session_id:?} carries no subscription id"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Reconciled { anomalies: Vec<WebhookAnomaly> },
    Ignored { event_type: String },
}

pub struct StripeWebhookUseCase<Cust, Sub, Stripe>
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    customer_repo: Arc<Cust>,
    subscription_repo: Arc<Sub>,
    stripe_client: Arc<Stripe>,
    verifier: Arc<WebhookVerifier>,
}

impl<Cust, Sub, Stripe> StripeWebhookUseCase<Cust, Sub, Stripe>
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        customer_repo: Arc<Cust>,
        subscription_repo: Arc<Sub>,
        stripe_client: Arc<Stripe>,
        verifier: Arc<WebhookVerifier>,
    ) -> Self {
        Self {
            customer_repo,
            subscription_repo,
            stripe_client,
            verifier,
        }
    }

    /// Verifies a raw delivery and reconciles it. Nothing is read or written
    /// unless the signature checks out.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> UseCaseResult<WebhookOutcome> {
        let event = self
            .verifier
            .verify(payload, signature_header)
            .map_err(|err| {
                warn!(error = %err, "stripe_webhook: rejected delivery");
                StripeWebhookError::from(err)
            })?;

        self.reconcile(&event).await
    }

    pub async fn reconcile(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let event_id = event.id.as_deref().unwrap_or("<none>");
        info!(event_id, event_type = %event.type_, "stripe_webhook: reconciling event");

        let anomalies = match event.type_.as_str() {
            "customer.subscription.created"
            | "customer.subscription.updated"
            | "customer.subscription.deleted" => {
                let subscription: StripeSubscription = decode_object(event)?;
                self.upsert_subscription(subscription)
                    .await?
                    .into_iter()
                    .collect()
            }
            "invoice.paid" | "invoice.payment_failed" => self.reconcile_invoice(event).await?,
            "checkout.session.completed" => self.reconcile_checkout(event).await?,
            other => {
                info!(event_id, event_type = other, "stripe_webhook: ignoring unhandled event type");
                return Ok(WebhookOutcome::Ignored {
                    event_type: other.to_string(),
                });
            }
        };

        for anomaly in &anomalies {
            warn!(
                event_id,
                event_type = %event.type_,
                anomaly = anomaly.kind(),
                detail = %anomaly,
                "stripe_webhook: event acknowledged with anomaly"
            );
        }

        Ok(WebhookOutcome::Reconciled { anomalies })
    }

    async fn reconcile_invoice(&self, event: &StripeEvent) -> UseCaseResult<Vec<WebhookAnomaly>> {
        let invoice: StripeInvoice = decode_object(event)?;

        // Invoice-embedded subscription fields can be stale; always re-fetch.
        let Some(subscription_id) = invoice.subscription_id() else {
            info!(invoice_id = ?invoice.id, "stripe_webhook: invoice has no subscription");
            return Ok(Vec::new());
        };

        let subscription = self.fetch_subscription(subscription_id).await?;
        Ok(self
            .upsert_subscription(subscription)
            .await?
            .into_iter()
            .collect())
    }

    async fn reconcile_checkout(&self, event: &StripeEvent) -> UseCaseResult<Vec<WebhookAnomaly>> {
        let session: StripeCheckoutSession = decode_object(event)?;
        let owning_user = session.client_reference_id();

        if let (Some(user_id), Some(customer_id)) = (owning_user, session.customer_id()) {
            self.customer_repo
                .upsert_customer_link(CustomerLinkEntity {
                    user_id: user_id.to_string(),
                    stripe_customer_id: customer_id.to_string(),
                })
                .await
                .map_err(|err| {
                    error!(
                        user_id,
                        stripe_customer_id = customer_id,
                        db_error = ?err,
                        "stripe_webhook: failed to upsert customer link"
                    );
                    StripeWebhookError::StoreWriteFailed(err)
                })?;
            info!(user_id, stripe_customer_id = customer_id, "stripe_webhook: customer link stored");
        }

        if !session.is_subscription_mode() {
            return Ok(Vec::new());
        }

        let Some(subscription_id) = session.subscription_id() else {
            return Ok(vec![WebhookAnomaly::CheckoutMissingSubscription {
                session_id: session.id.clone(),
            }]);
        };

        let mut subscription = self.fetch_subscription(subscription_id).await?;

        if subscription.owning_user_id().is_none() {
            if let Some(user_id) = owning_user {
                subscription
                    .metadata
                    .insert(OWNING_USER_METADATA_KEY.to_string(), user_id.to_string());
                info!(
                    subscription_id,
                    user_id,
                    "stripe_webhook: backfilled owning user from client_reference_id"
                );
            }
        }

        Ok(self.upsert_subscription(subscription).await?.into_iter().collect())
    }

    async fn fetch_subscription(&self, subscription_id: &str) -> UseCaseResult<StripeSubscription> {
        self.stripe_client
            .retrieve_subscription(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    stripe_error = ?err,
                    "stripe_webhook: failed to retrieve subscription"
                );
                StripeWebhookError::UpstreamFetchFailed(err)
            })
    }

    /// Writes the subscription, or reports why it cannot be attributed to a user.
    async fn upsert_subscription(
        &self,
        subscription: StripeSubscription,
    ) -> UseCaseResult<Option<WebhookAnomaly>> {
        let Some(user_id) = subscription.owning_user_id() else {
            return Ok(Some(WebhookAnomaly::OwningUserUnresolvable {
                subscription_id: subscription.id.clone(),
            }));
        };

        let record = subscription_record(&subscription, user_id)?;
        let status = record.status.clone();

        self.subscription_repo
            .upsert_subscription(record)
            .await
            .map_err(|err| {
                error!(
                    subscription_id = %subscription.id,
                    user_id,
                    db_error = ?err,
                    "stripe_webhook: failed to upsert subscription"
                );
                StripeWebhookError::StoreWriteFailed(err)
            })?;

        info!(
            subscription_id = %subscription.id,
            user_id,
            %status,
            "stripe_webhook: subscription upserted"
        );
        Ok(None)
    }
}

fn decode_object<T: DeserializeOwned>(event: &StripeEvent) -> UseCaseResult<T> {
    event.object_as::<T>().map_err(|err| {
        error!(
            event_id = ?event.id,
            event_type = %event.type_,
            decode_error = %err,
            "stripe_webhook: embedded object does not match its event type"
        );
        StripeWebhookError::MalformedObject(format!("{}: {}", event.type_, err))
    })
}

fn timestamp(seconds: i64, field: &str) -> UseCaseResult<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| StripeWebhookError::MalformedObject(format!("{field} is out of range")))
}

fn optional_timestamp(seconds: Option<i64>, field: &str) -> UseCaseResult<Option<DateTime<Utc>>> {
    seconds.map(|value| timestamp(value, field)).transpose()
}

/// Full-row image of a Stripe subscription for the given owner.
pub fn subscription_record(
    subscription: &StripeSubscription,
    user_id: &str,
) -> UseCaseResult<SubscriptionRecordEntity> {
    let missing = |field: &str| {
        StripeWebhookError::MalformedObject(format!(
            "subscription {} has no {field}",
            subscription.id
        ))
    };

    let period_start = subscription
        .period_start()
        .ok_or_else(|| missing("current_period_start"))?;
    let period_end = subscription
        .period_end()
        .ok_or_else(|| missing("current_period_end"))?;

    let quantity = subscription
        .quantity()
        .map(i32::try_from)
        .transpose()
        .map_err(|_| missing("quantity within range"))?;

    let metadata = serde_json::to_value(&subscription.metadata)
        .map_err(|err| StripeWebhookError::MalformedObject(err.to_string()))?;

    Ok(SubscriptionRecordEntity {
        id: subscription.id.clone(),
        user_id: user_id.to_string(),
        metadata,
        status: subscription.status.to_string(),
        price_id: subscription.price_id().map(str::to_string),
        quantity,
        cancel_at_period_end: subscription.cancel_at_period_end,
        created: timestamp(subscription.created, "created")?,
        current_period_start: timestamp(period_start, "current_period_start")?,
        current_period_end: timestamp(period_end, "current_period_end")?,
        ended_at: optional_timestamp(subscription.ended_at, "ended_at")?,
        cancel_at: optional_timestamp(subscription.cancel_at, "cancel_at")?,
        canceled_at: optional_timestamp(subscription.canceled_at, "canceled_at")?,
        trial_start: optional_timestamp(subscription.trial_start, "trial_start")?,
        trial_end: optional_timestamp(subscription.trial_end, "trial_end")?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use copyforge_core::{
        domain::repositories::{
            customers::MockCustomerLinkRepository,
            subscriptions::MockSubscriptionRecordRepository,
        },
        payments::webhook_verifier::compute_signature,
    };
    use mockall::predicate::eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::usecases::stripe_gateway::MockStripeGateway;

    const SECRET: &str = "whsec_reconciler_tests";
    const OWNER: &str = "5b7c1f0e-3c1d-4f0a-9a55-2f4e8d0c6b11";

    fn subscription_json(id: &str, status: &str, owner: Option<&str>) -> Value {
        let metadata = match owner {
            Some(owner) => json!({ "supabaseUserId": owner, "plan": "pro" }),
            None => json!({}),
        };

        json!({
            "id": id,
            "object": "subscription",
            "status": status,
            "customer": "cus_1",
            "metadata": metadata,
            "cancel_at_period_end": false,
            "created": 1_735_000_000,
            "current_period_start": 1_735_000_000,
            "current_period_end": 1_737_678_400,
            "ended_at": null,
            "cancel_at": null,
            "canceled_at": null,
            "trial_start": null,
            "trial_end": null,
            "items": { "data": [{ "price": { "id": "price_pro" }, "quantity": 1 }] }
        })
    }

    fn subscription(id: &str, status: &str, owner: Option<&str>) -> StripeSubscription {
        serde_json::from_value(subscription_json(id, status, owner)).unwrap()
    }

    fn event(event_type: &str, object: Value) -> StripeEvent {
        serde_json::from_value(json!({
            "id": "evt_test",
            "type": event_type,
            "created": 1_735_000_000,
            "livemode": false,
            "data": { "object": object }
        }))
        .unwrap()
    }

    fn usecase(
        customer_repo: MockCustomerLinkRepository,
        subscription_repo: MockSubscriptionRecordRepository,
        stripe: MockStripeGateway,
    ) -> StripeWebhookUseCase<MockCustomerLinkRepository, MockSubscriptionRecordRepository, MockStripeGateway>
    {
        StripeWebhookUseCase::new(
            Arc::new(customer_repo),
            Arc::new(subscription_repo),
            Arc::new(stripe),
            Arc::new(WebhookVerifier::new(Some(SECRET.to_string()))),
        )
    }

    fn capture_upserts(
        repo: &mut MockSubscriptionRecordRepository,
        times: usize,
    ) -> Arc<Mutex<Vec<SubscriptionRecordEntity>>> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        repo.expect_upsert_subscription()
            .times(times)
            .returning(move |record| {
                sink.lock().unwrap().push(record);
                Ok(())
            });
        captured
    }

    fn capture_links(
        repo: &mut MockCustomerLinkRepository,
        times: usize,
    ) -> Arc<Mutex<Vec<CustomerLinkEntity>>> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        repo.expect_upsert_customer_link()
            .times(times)
            .returning(move |link| {
                sink.lock().unwrap().push(link);
                Ok(())
            });
        captured
    }

    #[tokio::test]
    async fn signed_delivery_is_reconciled() {
        let payload = serde_json::to_vec(&json!({
            "id": "evt_signed",
            "type": "customer.subscription.updated",
            "data": { "object": subscription_json("sub_1", "active", Some(OWNER)) }
        }))
        .unwrap();
        let timestamp = Utc::now().timestamp().to_string();
        let header = format!(
            "t={},v1={}",
            timestamp,
            compute_signature(SECRET, &timestamp, &payload).unwrap()
        );

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        let captured = capture_upserts(&mut subscription_repo, 1);

        let outcome = usecase(
            MockCustomerLinkRepository::new(),
            subscription_repo,
            MockStripeGateway::new(),
        )
        .handle_webhook(&payload, Some(&header))
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::Reconciled { anomalies: vec![] });
        assert_eq!(captured.lock().unwrap()[0].id, "sub_1");
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_before_any_side_effect() {
        let payload = serde_json::to_vec(&json!({
            "type": "customer.subscription.updated",
            "data": { "object": subscription_json("sub_1", "active", None) }
        }))
        .unwrap();
        let timestamp = Utc::now().timestamp().to_string();
        let header = format!(
            "t={},v1={}",
            timestamp,
            compute_signature("whsec_attacker", &timestamp, &payload).unwrap()
        );

        // Mocks without expectations panic if touched.
        let result = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            MockStripeGateway::new(),
        )
        .handle_webhook(&payload, Some(&header))
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, StripeWebhookError::SignatureInvalid(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_secret_is_a_configuration_error() {
        let usecase = StripeWebhookUseCase::new(
            Arc::new(MockCustomerLinkRepository::new()),
            Arc::new(MockSubscriptionRecordRepository::new()),
            Arc::new(MockStripeGateway::new()),
            Arc::new(WebhookVerifier::new(None)),
        );

        let err = usecase
            .handle_webhook(b"{}", Some("t=1,v1=00"))
            .await
            .unwrap_err();

        assert!(matches!(err, StripeWebhookError::ConfigurationMissing(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn replaying_a_subscription_update_yields_identical_upserts() {
        let event = event(
            "customer.subscription.updated",
            subscription_json("sub_1", "active", Some(OWNER)),
        );

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        let captured = capture_upserts(&mut subscription_repo, 2);
        let usecase = usecase(
            MockCustomerLinkRepository::new(),
            subscription_repo,
            MockStripeGateway::new(),
        );

        usecase.reconcile(&event).await.unwrap();
        usecase.reconcile(&event).await.unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0], captured[1]);
        assert_eq!(captured[0].user_id, OWNER);
        assert_eq!(captured[0].status, "active");
        assert_eq!(captured[0].price_id.as_deref(), Some("price_pro"));
        assert_eq!(captured[0].quantity, Some(1));
        assert_eq!(captured[0].current_period_start.timestamp(), 1_735_000_000);
        assert_eq!(captured[0].metadata["plan"], "pro");
    }

    #[tokio::test]
    async fn subscription_owner_is_stored_whatever_its_format() {
        let event = event(
            "customer.subscription.created",
            subscription_json("sub_10", "trialing", Some("user_42")),
        );

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        let captured = capture_upserts(&mut subscription_repo, 1);

        let outcome = usecase(
            MockCustomerLinkRepository::new(),
            subscription_repo,
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::Reconciled { anomalies: vec![] });
        assert_eq!(captured.lock().unwrap()[0].user_id, "user_42");
    }

    #[tokio::test]
    async fn checkout_links_customer_and_backfills_owner_metadata() {
        let event = event(
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "object": "checkout.session",
                "mode": "subscription",
                "customer": "cus_1",
                "subscription": "sub_1",
                "client_reference_id": "user_1"
            }),
        );

        let mut customer_repo = MockCustomerLinkRepository::new();
        let links = capture_links(&mut customer_repo, 1);

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_retrieve_subscription()
            .withf(|id| id == "sub_1")
            .times(1)
            .returning(|_| Ok(subscription("sub_1", "active", None)));

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        let captured = capture_upserts(&mut subscription_repo, 1);

        let outcome = usecase(customer_repo, subscription_repo, stripe)
            .reconcile(&event)
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Reconciled { anomalies: vec![] });
        assert_eq!(
            *links.lock().unwrap(),
            vec![CustomerLinkEntity {
                user_id: "user_1".to_string(),
                stripe_customer_id: "cus_1".to_string(),
            }]
        );
        let record = &captured.lock().unwrap()[0];
        assert_eq!(record.id, "sub_1");
        assert_eq!(record.user_id, "user_1");
        assert_eq!(record.metadata[OWNING_USER_METADATA_KEY], "user_1");
    }

    #[tokio::test]
    async fn checkout_keeps_existing_owner_metadata() {
        let event = event(
            "checkout.session.completed",
            json!({
                "id": "cs_2",
                "mode": "subscription",
                "subscription": { "id": "sub_9", "object": "subscription" },
                "client_reference_id": "someone_else"
            }),
        );

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_retrieve_subscription()
            .withf(|id| id == "sub_9")
            .returning(|_| Ok(subscription("sub_9", "trialing", Some(OWNER))));

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        let captured = capture_upserts(&mut subscription_repo, 1);

        // No customer on the session, so no link is written.
        usecase(MockCustomerLinkRepository::new(), subscription_repo, stripe)
            .reconcile(&event)
            .await
            .unwrap();

        assert_eq!(captured.lock().unwrap()[0].user_id, OWNER);
    }

    #[tokio::test]
    async fn checkout_without_reference_or_metadata_is_a_soft_anomaly() {
        let event = event(
            "checkout.session.completed",
            json!({
                "id": "cs_3",
                "mode": "subscription",
                "customer": "cus_3",
                "subscription": "sub_3",
                "client_reference_id": ""
            }),
        );

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_retrieve_subscription()
            .returning(|_| Ok(subscription("sub_3", "active", None)));

        let outcome = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            stripe,
        )
        .reconcile(&event)
        .await
        .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Reconciled {
                anomalies: vec![WebhookAnomaly::OwningUserUnresolvable {
                    subscription_id: "sub_3".to_string(),
                }]
            }
        );
    }

    #[tokio::test]
    async fn customer_link_failure_aborts_before_fetching_the_subscription() {
        let event = event(
            "checkout.session.completed",
            json!({
                "id": "cs_6",
                "mode": "subscription",
                "customer": "cus_6",
                "subscription": "sub_6",
                "client_reference_id": "user_6"
            }),
        );

        let mut customer_repo = MockCustomerLinkRepository::new();
        customer_repo
            .expect_upsert_customer_link()
            .times(1)
            .returning(|_| Err(anyhow!("connection reset")));

        let mut stripe = MockStripeGateway::new();
        stripe.expect_retrieve_subscription().never();

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        subscription_repo.expect_upsert_subscription().never();

        let err = usecase(customer_repo, subscription_repo, stripe)
            .reconcile(&event)
            .await
            .unwrap_err();

        assert!(matches!(err, StripeWebhookError::StoreWriteFailed(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn payment_checkout_only_links_the_customer() {
        let event = event(
            "checkout.session.completed",
            json!({
                "id": "cs_4",
                "mode": "payment",
                "customer": "cus_4",
                "client_reference_id": OWNER
            }),
        );

        let mut customer_repo = MockCustomerLinkRepository::new();
        customer_repo
            .expect_upsert_customer_link()
            .with(eq(CustomerLinkEntity {
                user_id: OWNER.to_string(),
                stripe_customer_id: "cus_4".to_string(),
            }))
            .times(1)
            .returning(|_| Ok(()));

        let outcome = usecase(
            customer_repo,
            MockSubscriptionRecordRepository::new(),
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::Reconciled { anomalies: vec![] });
    }

    #[tokio::test]
    async fn subscription_checkout_without_subscription_id_is_a_soft_anomaly() {
        let event = event(
            "checkout.session.completed",
            json!({ "id": "cs_5", "mode": "subscription" }),
        );

        let outcome = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Reconciled {
                anomalies: vec![WebhookAnomaly::CheckoutMissingSubscription {
                    session_id: Some("cs_5".to_string())
                }]
            }
        );
    }

    #[tokio::test]
    async fn failed_invoice_uses_live_subscription_status() {
        // The invoice embeds a stale copy claiming the subscription is active.
        let event = event(
            "invoice.payment_failed",
            json!({
                "id": "in_1",
                "object": "invoice",
                "status": "open",
                "subscription": subscription_json("sub_2", "active", Some(OWNER))
            }),
        );

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_retrieve_subscription()
            .withf(|id| id == "sub_2")
            .times(1)
            .returning(|_| Ok(subscription("sub_2", "past_due", Some(OWNER))));

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        let captured = capture_upserts(&mut subscription_repo, 1);

        usecase(MockCustomerLinkRepository::new(), subscription_repo, stripe)
            .reconcile(&event)
            .await
            .unwrap();

        assert_eq!(captured.lock().unwrap()[0].status, "past_due");
    }

    #[tokio::test]
    async fn paid_invoice_without_subscription_is_a_no_op() {
        let event = event("invoice.paid", json!({ "id": "in_2", "object": "invoice" }));

        let outcome = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::Reconciled { anomalies: vec![] });
    }

    #[tokio::test]
    async fn created_subscription_without_owner_is_acknowledged_without_write() {
        let event = event(
            "customer.subscription.created",
            subscription_json("sub_3", "incomplete", None),
        );

        let outcome = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Reconciled {
                anomalies: vec![WebhookAnomaly::OwningUserUnresolvable {
                    subscription_id: "sub_3".to_string(),
                }]
            }
        );
    }

    #[tokio::test]
    async fn unrecognised_event_types_are_ignored() {
        let event = event("customer.created", json!({ "id": "cus_1" }));

        let outcome = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                event_type: "customer.created".to_string()
            }
        );
    }

    #[tokio::test]
    async fn store_failure_aborts_with_a_retryable_error() {
        let event = event(
            "customer.subscription.deleted",
            subscription_json("sub_4", "canceled", Some(OWNER)),
        );

        let mut subscription_repo = MockSubscriptionRecordRepository::new();
        subscription_repo
            .expect_upsert_subscription()
            .returning(|_| Err(anyhow!("connection reset")));

        let err = usecase(
            MockCustomerLinkRepository::new(),
            subscription_repo,
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap_err();

        assert!(matches!(err, StripeWebhookError::StoreWriteFailed(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_before_any_write() {
        let event = event("invoice.paid", json!({ "id": "in_3", "subscription": "sub_5" }));

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_retrieve_subscription()
            .returning(|_| Err(anyhow!("stripe unavailable")));

        let err = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            stripe,
        )
        .reconcile(&event)
        .await
        .unwrap_err();

        assert!(matches!(err, StripeWebhookError::UpstreamFetchFailed(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn undecodable_subscription_object_is_malformed() {
        let event = event(
            "customer.subscription.updated",
            json!({ "id": "sub_6", "status": "active" }),
        );

        let err = usecase(
            MockCustomerLinkRepository::new(),
            MockSubscriptionRecordRepository::new(),
            MockStripeGateway::new(),
        )
        .reconcile(&event)
        .await
        .unwrap_err();

        assert!(matches!(err, StripeWebhookError::MalformedObject(_)));
    }

    #[test]
    fn record_requires_a_billing_period() {
        let mut value = subscription_json("sub_7", "active", None);
        value["current_period_end"] = Value::Null;
        let subscription: StripeSubscription = serde_json::from_value(value).unwrap();

        let result = subscription_record(&subscription, OWNER);

        assert!(matches!(result, Err(StripeWebhookError::MalformedObject(_))));
    }

    #[test]
    fn record_converts_optional_timestamps() {
        let mut value = subscription_json("sub_8", "canceled", None);
        value["canceled_at"] = json!(1_736_000_000);
        value["cancel_at_period_end"] = json!(true);
        let subscription: StripeSubscription = serde_json::from_value(value).unwrap();

        let record = subscription_record(&subscription, OWNER).unwrap();

        assert_eq!(
            record.canceled_at.map(|at| at.timestamp()),
            Some(1_736_000_000)
        );
        assert_eq!(record.ended_at, None);
        assert!(record.cancel_at_period_end);
        assert_eq!(record.status, "canceled");
    }
}
