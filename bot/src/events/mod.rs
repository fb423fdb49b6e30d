//! Webhook event handling

pub mod dispatch;
pub mod signature;
