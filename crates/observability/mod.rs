mod config;
mod layer;
mod notifier;
mod webhook_sink;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::ObservabilityConfig;
use layer::AlertLayer;
use notifier::Notifier;
use webhook_sink::WebhookAlertSink;

pub use layer::ANOMALY_FIELD;

/// Installs the global subscriber: fmt output filtered by `RUST_LOG` plus the
/// optional alert layer. Must run inside a tokio runtime.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);
    let mut warnings = config.warnings.clone();

    let alert_layer = match config.alert.as_ref() {
        Some(alert) => match WebhookAlertSink::new(alert.webhook_url.clone()) {
            Ok(sink) => Some(AlertLayer::new(
                Notifier::new(vec![Arc::new(sink)]),
                config.service_context.clone(),
                alert.min_level,
            )),
            Err(err) => {
                warnings.push(format!("alert sink could not be built; alerts disabled: {err}"));
                None
            }
        },
        None => None,
    };
    let alerts_enabled = alert_layer.is_some();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so `TZ` is reflected in the offset.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(alert_layer)
        .try_init()?;

    let context = &config.service_context;
    for warning in &warnings {
        warn!(
            service = %context.service_name,
            environment = %context.environment,
            component = %context.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %context.service_name,
        environment = %context.environment,
        component = %context.component,
        alerts_enabled,
        "observability: initialized"
    );

    Ok(())
}
