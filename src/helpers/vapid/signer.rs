use base64::{engine, Engine};
use serde_json::{Map, Value};

use crate::helpers::error::WebPushError;
use crate::helpers::vapid::key::VapidKey;
use crate::helpers::vapid::VapidSignature;

/// JWT claims of a VAPID token.
pub type Claims = Map<String, Value>;

#[derive(Serialize)]
struct JwtHeader {
    typ: &'static str,
    alg: &'static str,
}

const JWT_HEADER: JwtHeader = JwtHeader {
    typ: "JWT",
    alg: "ES256",
};

/// Signs VAPID claims into a compact ES256 JWT.
pub struct VapidSigner;

impl VapidSigner {
    pub fn sign(key: &VapidKey, claims: &Claims) -> Result<VapidSignature, WebPushError> {
        let header = serde_json::to_vec(&JWT_HEADER)?;
        let payload = serde_json::to_vec(claims)?;

        let signing_input = format!("{}.{}", encode(&header), encode(&payload));
        let signature = key.sign(signing_input.as_bytes());

        trace!("Signed VAPID claims {:?}", claims);

        Ok(VapidSignature {
            auth_t: format!("{}.{}", signing_input, encode(&signature)),
            auth_k: key.public_key(),
        })
    }
}

fn encode(bytes: &[u8]) -> String {
    engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
