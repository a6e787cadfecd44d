//! The push delivery client the dispatcher retries around.

use async_trait::async_trait;

use crate::helpers::clients::WebPushClient;
use crate::helpers::config::VapidConfig;
use crate::helpers::error::WebPushError;
use crate::helpers::http_ece::ContentEncoding;
use crate::helpers::message::{SubscriptionInfo, Urgency, WebPushMessageBuilder, DEFAULT_TTL};
use crate::helpers::vapid::PartialVapidSignatureBuilder;

/// Delivers one serialized payload to one subscription.
///
/// Failures coming from the push service carry their status code, see
/// [`WebPushError::status_code`].
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn deliver(
        &self,
        subscription: &SubscriptionInfo,
        payload: &str,
    ) -> Result<(), WebPushError>;
}

/// Signs, encrypts and sends messages through a [`WebPushClient`].
pub struct VapidPushClient<C> {
    transport: C,
    signer: PartialVapidSignatureBuilder,
    ttl: u32,
    urgency: Option<Urgency>,
}

impl<C: WebPushClient> VapidPushClient<C> {
    pub fn new(config: &VapidConfig, transport: C) -> Result<Self, WebPushError> {
        Ok(VapidPushClient {
            transport,
            signer: config.signature_builder()?,
            ttl: DEFAULT_TTL,
            urgency: None,
        })
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// The key browsers pass as `applicationServerKey` when subscribing.
    pub fn public_key(&self) -> Vec<u8> {
        self.signer.get_public_key()
    }
}

#[async_trait]
impl<C: WebPushClient> PushDelivery for VapidPushClient<C> {
    async fn deliver(
        &self,
        subscription: &SubscriptionInfo,
        payload: &str,
    ) -> Result<(), WebPushError> {
        let signature = self.signer.clone().add_sub_info(subscription).build()?;

        let mut builder = WebPushMessageBuilder::new(subscription);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload.as_bytes());
        builder.set_vapid_signature(signature);
        builder.set_ttl(self.ttl);
        if let Some(urgency) = self.urgency {
            builder.set_urgency(urgency);
        }

        let message = builder.build()?;
        self.transport.send(message).await
    }
}
