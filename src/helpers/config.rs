//! Process-wide VAPID configuration.
//!
//! The contact URI and the key pair are read once at startup and never change
//! for the lifetime of the process:
//!
//! | Variable            | Meaning                                                  |
//! |---------------------|----------------------------------------------------------|
//! | `VAPID_SUBJECT`     | `mailto:` (or `https:`) contact URI of the operator      |
//! | `VAPID_PUBLIC_KEY`  | base64url uncompressed P-256 point, the browser's `applicationServerKey` |
//! | `VAPID_PRIVATE_KEY` | base64url raw 32-byte P-256 scalar                       |

use crate::helpers::error::WebPushError;
use crate::helpers::vapid::{PartialVapidSignatureBuilder, VapidKeyGenerator};

pub const VAPID_SUBJECT: &str = "VAPID_SUBJECT";
pub const VAPID_PUBLIC_KEY: &str = "VAPID_PUBLIC_KEY";
pub const VAPID_PRIVATE_KEY: &str = "VAPID_PRIVATE_KEY";

#[derive(Clone, PartialEq, Eq)]
pub struct VapidConfig {
    pub subject: String,
    pub public_key: String,
    private_key: String,
}

impl std::fmt::Debug for VapidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidConfig")
            .field("subject", &self.subject)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl VapidConfig {
    /// Validates the contact URI and checks that both keys belong together.
    pub fn new<S: Into<String>>(
        subject: S,
        public_key: S,
        private_key: S,
    ) -> Result<VapidConfig, WebPushError> {
        let subject = subject.into();
        let public_key = public_key.into().trim().trim_end_matches('=').to_string();
        let private_key = private_key.into();

        if !(subject.starts_with("mailto:") || subject.starts_with("https:")) {
            return Err(WebPushError::InvalidVapidSubject(subject));
        }

        let derived = VapidKeyGenerator::from_base64(&private_key)?.public_key_base64();
        if derived != public_key {
            return Err(WebPushError::MismatchedVapidKeys);
        }

        Ok(VapidConfig {
            subject,
            public_key,
            private_key,
        })
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<VapidConfig, WebPushError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<VapidConfig, WebPushError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| WebPushError::MissingConfig(name.to_string()))
        };

        let config = Self::new(
            read(VAPID_SUBJECT)?,
            read(VAPID_PUBLIC_KEY)?,
            read(VAPID_PRIVATE_KEY)?,
        )?;

        info!(
            "Loaded VAPID configuration for {} with public key {}",
            config.subject, config.public_key
        );

        Ok(config)
    }

    /// A signer carrying the private key and the `sub` claim, shared by every delivery.
    pub fn signature_builder(&self) -> Result<PartialVapidSignatureBuilder, WebPushError> {
        let mut builder = VapidKeyGenerator::from_base64(&self.private_key)
            .map(|generator| PartialVapidSignatureBuilder::new(generator.to_vapid_key()))?;
        builder.add_claim("sub", self.subject.as_str());
        Ok(builder)
    }
}
