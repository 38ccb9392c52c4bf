pub mod content_statuses;
pub mod subscription_statuses;
