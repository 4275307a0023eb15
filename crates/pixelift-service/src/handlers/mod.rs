//! HTTP request handlers.

pub mod credits;
pub mod health;
pub mod images;
pub mod media;
pub mod users;
pub mod webhooks;
