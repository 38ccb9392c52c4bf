#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub stripe: Stripe,
    pub openai: OpenAi,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// Bytes, converted from `SERVER_BODY_LIMIT` in MiB.
    pub body_limit: usize,
    /// seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    /// Absent secret keeps the server up; the webhook endpoint then answers 400.
    pub webhook_secret: Option<String>,
    pub api_base_url: String,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
    pub price_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAi {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}
