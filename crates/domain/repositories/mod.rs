pub mod comments;
pub mod content;
pub mod customers;
pub mod subscriptions;
