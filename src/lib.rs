pub use crate::dispatcher::{
    DeliveryOutcome, NotificationDispatcher, RetryPolicy, MAX_RETRIES, RETRY_DELAY,
};
pub use crate::helpers::clients::request_builder;
#[cfg(feature = "reqwest-client")]
pub use crate::helpers::clients::reqwest_client::ReqwestWebPushClient;
pub use crate::helpers::clients::WebPushClient;
pub use crate::helpers::config::VapidConfig;
pub use crate::helpers::delivery::{PushDelivery, VapidPushClient};
pub use crate::helpers::error::{ErrorInfo, RetryAfter, WebPushError};
pub use crate::helpers::http_ece::ContentEncoding;
pub use crate::helpers::message::{
    SubscriptionInfo, SubscriptionKeys, Urgency, WebPushMessage, WebPushMessageBuilder,
    WebPushPayload,
};
pub use crate::helpers::vapid::{
    PartialVapidSignatureBuilder, VapidKey, VapidKeyGenerator, VapidSignature,
    VapidSignatureBuilder,
};
pub use base64::{engine, Engine};

mod dispatcher;
mod helpers;

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
