//! Contains implementations of web push clients.
//!
//! [`request_builder`] contains the functions used to send and consume push http messages.
//! This module should be consumed by each client, by using [`http`]'s flexible api.

use crate::helpers::error::WebPushError;
use async_trait::async_trait;

use super::message::WebPushMessage;

pub mod request_builder;

#[cfg(feature = "reqwest-client")]
pub mod reqwest_client;

/// An async client for sending the notification payload.
/// Other features, such as thread safety, may vary by implementation.
#[async_trait]
pub trait WebPushClient: Send + Sync {
    /// Sends a notification. Whether it can time out depends on the implementation.
    async fn send(&self, message: WebPushMessage) -> Result<(), WebPushError>;
}
