use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use signature::Signer;

/// The P-256 key the application server signs VAPID tokens with.
#[derive(Clone, Debug)]
pub struct VapidKey(SigningKey);

impl VapidKey {
    pub fn new(signing_key: SigningKey) -> VapidKey {
        VapidKey(signing_key)
    }

    /// Uncompressed SEC1 public key, 65 bytes starting with `0x04`.
    pub fn public_key(&self) -> Vec<u8> {
        self.verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey::from(&self.0)
    }

    /// ES256 signature in the fixed-size `r || s` form JWS expects.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.0.sign(message);
        signature.to_bytes().to_vec()
    }
}
