pub mod analysis;
pub mod comments;
pub mod content;
pub mod enums;
pub mod subscriptions;
