pub mod billing;
pub mod comments;
pub mod content;
pub mod content_analysis;
pub mod stripe_gateway;
pub mod stripe_webhook;
