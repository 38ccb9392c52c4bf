use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use copyforge_core::{
    domain::{
        repositories::{
            customers::CustomerLinkRepository, subscriptions::SubscriptionRecordRepository,
        },
        value_objects::subscriptions::{BillingCustomer, CheckoutSessionModel, PortalSessionModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{customers::CustomerLinkPostgres, subscriptions::SubscriptionRecordPostgres},
    },
    payments::stripe_client::StripeClient,
};

use crate::{
    auth::AuthUser,
    usecases::{
        billing::{BillingDefaults, BillingUseCase},
        stripe_gateway::StripeGateway,
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    defaults: BillingDefaults,
) -> Router {
    let customer_repository = CustomerLinkPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionRecordPostgres::new(Arc::clone(&db_pool));
    let billing_usecase = BillingUseCase::new(
        Arc::new(customer_repository),
        Arc::new(subscription_repository),
        stripe_client,
        defaults,
    );

    Router::new()
        .route("/portal", post(create_portal_session))
        .route("/checkout", post(create_checkout_session))
        .route("/subscriptions", get(list_subscriptions))
        .with_state(Arc::new(billing_usecase))
}

fn billing_customer(auth: AuthUser) -> BillingCustomer {
    BillingCustomer {
        user_id: auth.user_id,
        email: auth.email,
    }
}

pub async fn create_portal_session<Cust, Sub, Stripe>(
    State(billing_usecase): State<Arc<BillingUseCase<Cust, Sub, Stripe>>>,
    auth: AuthUser,
    payload: Option<Json<PortalSessionModel>>,
) -> Response
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    let model = payload.map(|Json(model)| model).unwrap_or_default();

    match billing_usecase
        .create_portal_session(billing_customer(auth), model)
        .await
    {
        Ok(redirect) => (StatusCode::OK, Json(redirect)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn create_checkout_session<Cust, Sub, Stripe>(
    State(billing_usecase): State<Arc<BillingUseCase<Cust, Sub, Stripe>>>,
    auth: AuthUser,
    payload: Option<Json<CheckoutSessionModel>>,
) -> Response
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    let model = payload.map(|Json(model)| model).unwrap_or_default();

    match billing_usecase
        .create_checkout_session(billing_customer(auth), model)
        .await
    {
        Ok(redirect) => (StatusCode::OK, Json(redirect)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_subscriptions<Cust, Sub, Stripe>(
    State(billing_usecase): State<Arc<BillingUseCase<Cust, Sub, Stripe>>>,
    auth: AuthUser,
) -> Response
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match billing_usecase.list_subscriptions(auth.user_id).await {
        Ok(subscriptions) => (StatusCode::OK, Json(subscriptions)).into_response(),
        Err(err) => err.into_response(),
    }
}
