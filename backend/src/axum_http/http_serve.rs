use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use copyforge_core::{
    ai::openai_client::{OpenAiClient, OpenAiConfig},
    infra::db::postgres::postgres_connection::PgPoolSquad,
    payments::{stripe_client::StripeClient, webhook_verifier::WebhookVerifier},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    auth::SupabaseJwtSecret,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::billing::BillingDefaults,
};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let stripe_client = Arc::new(StripeClient::new(
        config.stripe.secret_key.clone(),
        &config.stripe.api_base_url,
        config.stripe.success_url.clone(),
        config.stripe.cancel_url.clone(),
    )?);

    if config.stripe.webhook_secret.is_none() {
        warn!("STRIPE_WEBHOOK_SECRET is not set; Stripe webhooks will be rejected");
    }
    let verifier = Arc::new(WebhookVerifier::new(config.stripe.webhook_secret.clone()));

    let analyzer = match config.openai.api_key.as_ref() {
        Some(api_key) => Some(Arc::new(OpenAiClient::new(
            OpenAiConfig::new(api_key.clone())
                .with_model(config.openai.model.clone())
                .with_base_url(config.openai.base_url.clone()),
        )?)),
        None => {
            warn!("OPENAI_API_KEY is not set; content analysis is disabled");
            None
        }
    };

    let billing_defaults = BillingDefaults {
        price_id: config.stripe.price_id.clone(),
        portal_return_url: config.stripe.portal_return_url.clone(),
    };

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/webhooks",
            routers::stripe_webhook::routes(
                Arc::clone(&db_pool),
                Arc::clone(&stripe_client),
                verifier,
            ),
        )
        .nest(
            "/api/v1/billing",
            routers::billing::routes(Arc::clone(&db_pool), stripe_client, billing_defaults),
        )
        .nest(
            "/api/v1/content",
            routers::content::routes(Arc::clone(&db_pool), analyzer)
                .merge(routers::comments::routes(Arc::clone(&db_pool))),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(Arc::new(SupabaseJwtSecret(
            config.supabase.jwt_secret.clone(),
        ))))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(config.backend_server.body_limit))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
