//! * Contains code from rust-web-push [https://github.com/pimeys/rust-web-push]
//! * Copyright 2017 Julius de Bruijn
//! * Licensed under MIT License
//!
//! # Web Push
//!
//! Creating, signing and sending push notifications to a web browser. For
//! content payload encryption it uses [RFC8188](https://datatracker.ietf.org/doc/html/rfc8188)
//! with the `aes128gcm` scheme of [RFC8291](https://datatracker.ietf.org/doc/html/rfc8291),
//! and identifies the application server with VAPID ([RFC8292](https://datatracker.ietf.org/doc/html/rfc8292)).
//! A [`reqwest`](https://crates.io/crates/reqwest) based client is available with the
//! default feature `reqwest-client`.
//!
//! # Example
//!
//! ```no_run
//! # use tiffin_push::*;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
//! // VAPID_SUBJECT, VAPID_PUBLIC_KEY and VAPID_PRIVATE_KEY, read once at startup.
//! let config = VapidConfig::from_env()?;
//! let client = VapidPushClient::new(&config, ReqwestWebPushClient::new()?)?;
//! let dispatcher = NotificationDispatcher::new(client);
//!
//! // You would likely get this by deserializing a browser `pushSubscription` object.
//! let subscription = SubscriptionInfo::new(
//!     "https://updates.push.services.mozilla.com/wpush/v1/...",
//!     "key_from_browser_as_base64",
//!     "auth_from_browser_as_base64",
//! );
//!
//! dispatcher
//!     .send(&subscription, r#"{"title":"Your tiffin is on its way"}"#)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod crypto;
pub mod delivery;
pub mod error;
pub mod http_ece;
pub mod message;
pub mod vapid;
