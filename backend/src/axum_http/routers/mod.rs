pub mod billing;
pub mod comments;
pub mod content;
pub mod stripe_webhook;
