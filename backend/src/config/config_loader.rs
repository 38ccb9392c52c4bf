use anyhow::{Context, Result};
use copyforge_core::ai::openai_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

use super::config_model::{
    BackendServer, Database, DotEnvyConfig, OpenAi, Stripe, Supabase,
};

const DEFAULT_STRIPE_API_BASE_URL: &str = "https://api.stripe.com/";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const BYTES_PER_MIB: usize = 1024 * 1024;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    from_lookup(|key| std::env::var(key).ok())
}

pub fn from_lookup<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key)
            .filter(|value| !value.trim().is_empty())
            .with_context(|| format!("{key} is invalid"))
    };
    let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse::<usize>()
            .context("SERVER_BODY_LIMIT is invalid")?
            .checked_mul(BYTES_PER_MIB)
            .context("SERVER_BODY_LIMIT is too large")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: match optional("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().context("DATABASE_MAX_CONNECTIONS is invalid")?,
            None => DEFAULT_MAX_CONNECTIONS,
        },
    };

    let supabase = Supabase {
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
        api_base_url: optional("STRIPE_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE_URL.to_string()),
        success_url: required("STRIPE_SUCCESS_URL")?,
        cancel_url: required("STRIPE_CANCEL_URL")?,
        portal_return_url: required("STRIPE_PORTAL_RETURN_URL")?,
        price_id: optional("STRIPE_PRICE_ID"),
    };

    let openai = OpenAi {
        api_key: optional("OPENAI_API_KEY"),
        model: optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        base_url: optional("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        stripe,
        openai,
    })
}
