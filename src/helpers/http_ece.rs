//! Payload encryption algorithm

use base64::engine::general_purpose;
use base64::Engine;

use crate::helpers::crypto;
use crate::helpers::error::WebPushError;
use crate::helpers::message::WebPushPayload;
use crate::helpers::vapid::VapidSignature;

/// The largest payload that works with every major push service.
pub const MAX_PAYLOAD_LENGTH: usize = 3052;

/// Content encoding profiles.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum ContentEncoding {
    #[default]
    Aes128Gcm,
}

impl ContentEncoding {
    /// Gets the associated string for this content encoding, as would be used in the content-encoding header.
    pub fn to_str(&self) -> &'static str {
        match &self {
            ContentEncoding::Aes128Gcm => "aes128gcm",
        }
    }
}

/// Struct for handling payload encryption.
pub struct HttpEce<'a> {
    peer_public_key: &'a [u8],
    peer_secret: &'a [u8],
    encoding: ContentEncoding,
    vapid_signature: Option<VapidSignature>,
}

impl<'a> HttpEce<'a> {
    /// Create a new encryptor.
    ///
    /// `peer_public_key` is the `p256dh` and `peer_secret` the `auth` from
    /// browser subscription info.
    pub fn new(
        encoding: ContentEncoding,
        peer_public_key: &'a [u8],
        peer_secret: &'a [u8],
        vapid_signature: Option<VapidSignature>,
    ) -> HttpEce<'a> {
        HttpEce {
            peer_public_key,
            peer_secret,
            encoding,
            vapid_signature,
        }
    }

    /// Encrypts a payload. The salt and the ephemeral public key travel in the
    /// `aes128gcm` record header, so the only crypto header is the VAPID one.
    pub fn encrypt(&self, content: &[u8]) -> Result<WebPushPayload, WebPushError> {
        if content.len() > MAX_PAYLOAD_LENGTH {
            return Err(WebPushError::PayloadTooLarge);
        }

        crypto::install();

        match self.encoding {
            ContentEncoding::Aes128Gcm => {
                let data = ece::encrypt(self.peer_public_key, self.peer_secret, content)
                    .map_err(|_| WebPushError::InvalidCryptoKeys)?;

                let mut headers = vec![];
                self.add_vapid_headers(&mut headers);

                Ok(WebPushPayload {
                    content: data,
                    crypto_headers: headers,
                    content_encoding: self.encoding,
                })
            }
        }
    }

    /// Adds VAPID authorisation header to headers, if VAPID is being used.
    fn add_vapid_headers(&self, headers: &mut Vec<(&'static str, String)>) {
        if let Some(signature) = &self.vapid_signature {
            headers.push((
                "Authorization",
                format!(
                    "vapid t={}, k={}",
                    signature.auth_t,
                    general_purpose::URL_SAFE_NO_PAD.encode(&signature.auth_k)
                ),
            ));
        }
    }
}
