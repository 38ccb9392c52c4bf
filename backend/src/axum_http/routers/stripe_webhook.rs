use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use copyforge_core::{
    domain::repositories::{
        customers::CustomerLinkRepository, subscriptions::SubscriptionRecordRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{customers::CustomerLinkPostgres, subscriptions::SubscriptionRecordPostgres},
    },
    payments::{stripe_client::StripeClient, webhook_verifier::WebhookVerifier},
};
use serde_json::json;

use crate::usecases::{stripe_gateway::StripeGateway, stripe_webhook::StripeWebhookUseCase};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    verifier: Arc<WebhookVerifier>,
) -> Router {
    let customer_repository = CustomerLinkPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionRecordPostgres::new(Arc::clone(&db_pool));
    let stripe_webhook_usecase = StripeWebhookUseCase::new(
        Arc::new(customer_repository),
        Arc::new(subscription_repository),
        stripe_client,
        verifier,
    );

    Router::new()
        .route("/stripe", post(receive))
        .with_state(Arc::new(stripe_webhook_usecase))
}

/// Takes the body as raw bytes: the signature covers the exact payload.
pub async fn receive<Cust, Sub, Stripe>(
    State(stripe_webhook_usecase): State<Arc<StripeWebhookUseCase<Cust, Sub, Stripe>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match stripe_webhook_usecase.handle_webhook(&body, signature).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "received": true }))).into_response(),
        Err(err) => err.into_response(),
    }
}
