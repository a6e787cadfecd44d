use std::io::Read;

use http::uri::Uri;
use serde_json::Value;

use crate::helpers::error::WebPushError;
use crate::helpers::message::SubscriptionInfo;
use crate::helpers::vapid::generator::VapidKeyGenerator;
use crate::helpers::vapid::key::VapidKey;
use crate::helpers::vapid::signer::{Claims, VapidSigner};
use crate::helpers::vapid::VapidSignature;

/// Tokens expire after twelve hours unless an `exp` claim is given.
const DEFAULT_EXPIRY_SECS: i64 = 12 * 60 * 60;

/// Push services reject tokens valid for longer than a day.
const MAX_EXPIRY_SECS: i64 = 24 * 60 * 60;

/// A VAPID signature builder for generating an optional signature to the
/// request. The encryption is done with the subscription's push service as
/// the audience, so a builder is bound to one subscription.
///
/// To communicate with the site, one needs to generate a private key to keep in
/// the server and derive a public key from the generated private key for the
/// client. The public key goes to the browser as its `applicationServerKey`.
pub struct VapidSignatureBuilder<'a> {
    claims: Claims,
    key: VapidKey,
    subscription_info: &'a SubscriptionInfo,
}

impl<'a> VapidSignatureBuilder<'a> {
    /// Creates a new builder from a PEM formatted private key.
    pub fn from_pem<R: Read>(
        pk_pem: R,
        subscription_info: &'a SubscriptionInfo,
    ) -> Result<VapidSignatureBuilder<'a>, WebPushError> {
        Ok(Self::from_pem_no_sub(pk_pem)?.add_sub_info(subscription_info))
    }

    /// Creates a builder that can be bound to subscriptions later on.
    pub fn from_pem_no_sub<R: Read>(
        mut pk_pem: R,
    ) -> Result<PartialVapidSignatureBuilder, WebPushError> {
        let mut pem = String::new();
        pk_pem
            .read_to_string(&mut pem)
            .map_err(|_| WebPushError::InvalidSecretKey)?;

        let key = VapidKeyGenerator::from_pem(&pem)?.to_vapid_key();
        Ok(PartialVapidSignatureBuilder::new(key))
    }

    /// Creates a new builder from a raw base64url private key, the format
    /// `web-push generate-vapid-keys` prints.
    pub fn from_base64(
        encoded: &str,
        subscription_info: &'a SubscriptionInfo,
    ) -> Result<VapidSignatureBuilder<'a>, WebPushError> {
        Ok(Self::from_base64_no_sub(encoded)?.add_sub_info(subscription_info))
    }

    pub fn from_base64_no_sub(encoded: &str) -> Result<PartialVapidSignatureBuilder, WebPushError> {
        let key = VapidKeyGenerator::from_base64(encoded)?.to_vapid_key();
        Ok(PartialVapidSignatureBuilder::new(key))
    }

    /// Add a claim to the signature. Claims `aud` and `exp` are automatically
    /// added if not set, and `sub` should be the contact `mailto:` URI.
    pub fn add_claim<V>(&mut self, key: &str, val: V)
    where
        V: Into<Value>,
    {
        self.claims.insert(key.to_string(), val.into());
    }

    /// Get the public key for the signature, to be used as the
    /// `applicationServerKey` in the browser.
    pub fn get_public_key(&self) -> Vec<u8> {
        self.key.public_key()
    }

    /// Builds a signature to be used in [`WebPushMessageBuilder`](crate::WebPushMessageBuilder).
    pub fn build(self) -> Result<VapidSignature, WebPushError> {
        let mut claims = self.claims;
        let now = chrono::Utc::now().timestamp();

        if !claims.contains_key("aud") {
            let endpoint: Uri = self.subscription_info.endpoint.parse()?;
            let audience = match (endpoint.scheme_str(), endpoint.authority()) {
                (Some(scheme), Some(authority)) => format!("{}://{}", scheme, authority),
                _ => return Err(WebPushError::InvalidUri),
            };
            claims.insert("aud".to_string(), audience.into());
        }

        match claims.get("exp").map(Value::as_i64) {
            None => {
                claims.insert("exp".to_string(), (now + DEFAULT_EXPIRY_SECS).into());
            }
            Some(Some(exp)) if exp > now + MAX_EXPIRY_SECS => {
                return Err(WebPushError::InvalidClaims(format!(
                    "exp {} is more than 24 hours in the future",
                    exp
                )));
            }
            Some(Some(_)) => {}
            Some(None) => {
                return Err(WebPushError::InvalidClaims(
                    "exp must be a unix timestamp".to_string(),
                ));
            }
        }

        VapidSigner::sign(&self.key, &claims)
    }
}

/// A [`VapidSignatureBuilder`] without a subscription. The key and the
/// static claims (usually `sub`) are shared, so keep one per process and
/// clone it for every subscription.
#[derive(Clone, Debug)]
pub struct PartialVapidSignatureBuilder {
    key: VapidKey,
    claims: Claims,
}

impl PartialVapidSignatureBuilder {
    pub fn new(key: VapidKey) -> PartialVapidSignatureBuilder {
        PartialVapidSignatureBuilder {
            key,
            claims: Claims::new(),
        }
    }

    pub fn add_claim<V>(&mut self, key: &str, val: V)
    where
        V: Into<Value>,
    {
        self.claims.insert(key.to_string(), val.into());
    }

    pub fn add_sub_info(self, subscription_info: &SubscriptionInfo) -> VapidSignatureBuilder<'_> {
        VapidSignatureBuilder {
            claims: self.claims,
            key: self.key,
            subscription_info,
        }
    }

    pub fn get_public_key(&self) -> Vec<u8> {
        self.key.public_key()
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine, Engine};

    use super::*;

    const PRIVATE_KEY: &str = "IQ9Ur0ykXoHS9gzfYX0aBjy9lvdrjx_PFUXmie9YRcY";
    const PUBLIC_KEY: &str = "BMjQIp55pdbU8pfCBKyXcZjlmER_mXt5LqNrN1hrXbdBS5EnhIbMu3Au-RV53iIpztzNXkGI56BFB1udQ8Bq_H4";

    fn subscription() -> SubscriptionInfo {
        SubscriptionInfo::new(
            "https://updates.push.services.mozilla.com:443/wpush/v2/gAAAAABh",
            "BLMbF9ffKBiWQLCKvTHb6LO8Nb6dcUh6TItC455vu2kElga6PQvUmaFyCdykxY2nOSSL3yKgfbmFLRTUaGv4yV8",
            "xS03Fi5ErfTNH_l9WHE9Ig",
        )
    }

    fn decode_claims(auth_t: &str) -> Value {
        let payload = auth_t.split('.').nth(1).unwrap();
        serde_json::from_slice(
            &engine::general_purpose::URL_SAFE_NO_PAD
                .decode(payload)
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_builds_signature_with_default_claims() {
        let subscription = subscription();
        let mut builder = VapidSignatureBuilder::from_base64(PRIVATE_KEY, &subscription).unwrap();
        builder.add_claim("sub", "mailto:orders@tiffin.example");
        let signature = builder.build().unwrap();

        let claims = decode_claims(&signature.auth_t);
        assert_eq!(claims["aud"], "https://updates.push.services.mozilla.com:443");
        assert_eq!(claims["sub"], "mailto:orders@tiffin.example");

        let exp = claims["exp"].as_i64().unwrap();
        let now = chrono::Utc::now().timestamp();
        assert!(exp > now && exp <= now + DEFAULT_EXPIRY_SECS);

        assert_eq!(
            engine::general_purpose::URL_SAFE_NO_PAD.encode(&signature.auth_k),
            PUBLIC_KEY
        );
    }

    #[test]
    fn test_partial_builder_is_reusable() {
        let mut partial = VapidSignatureBuilder::from_base64_no_sub(PRIVATE_KEY).unwrap();
        partial.add_claim("sub", "mailto:orders@tiffin.example");

        let first = SubscriptionInfo::new("https://fcm.googleapis.com/fcm/send/a", "k", "a");
        let second = SubscriptionInfo::new("https://web.push.apple.com/QGx", "k", "a");

        let first_claims =
            decode_claims(&partial.clone().add_sub_info(&first).build().unwrap().auth_t);
        let second_claims =
            decode_claims(&partial.clone().add_sub_info(&second).build().unwrap().auth_t);

        assert_eq!(first_claims["aud"], "https://fcm.googleapis.com");
        assert_eq!(second_claims["aud"], "https://web.push.apple.com");
        assert_eq!(second_claims["sub"], "mailto:orders@tiffin.example");
    }

    #[test]
    fn test_from_pem() {
        let pem = VapidKeyGenerator::from_base64(PRIVATE_KEY)
            .unwrap()
            .secret_key_to_pem()
            .unwrap();
        let subscription = subscription();
        let builder = VapidSignatureBuilder::from_pem(pem.as_bytes(), &subscription).unwrap();
        assert_eq!(
            engine::general_purpose::URL_SAFE_NO_PAD.encode(builder.get_public_key()),
            PUBLIC_KEY
        );
    }

    #[test]
    fn test_expiry_too_far_in_the_future() {
        let subscription = subscription();
        let mut builder = VapidSignatureBuilder::from_base64(PRIVATE_KEY, &subscription).unwrap();
        builder.add_claim("exp", chrono::Utc::now().timestamp() + 2 * MAX_EXPIRY_SECS);
        assert!(matches!(
            builder.build(),
            Err(WebPushError::InvalidClaims(_))
        ));
    }

    #[test]
    fn test_invalid_private_key() {
        assert_eq!(
            VapidSignatureBuilder::from_base64_no_sub("not-a-key").unwrap_err(),
            WebPushError::InvalidSecretKey
        );
        assert!(VapidSignatureBuilder::from_pem_no_sub("garbage".as_bytes()).is_err());
    }
}
