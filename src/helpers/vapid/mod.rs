//! VAPID (RFC 8292) application server identification.

pub mod builder;
pub mod generator;
pub mod key;
pub mod signer;

pub use builder::{PartialVapidSignatureBuilder, VapidSignatureBuilder};
pub use generator::VapidKeyGenerator;
pub use key::VapidKey;

/// A struct representing a VAPID signature. Should be generated using the
/// [`VapidSignatureBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VapidSignature {
    /// The signed JWT, base64 encoded
    pub auth_t: String,
    /// The public key bytes
    pub auth_k: Vec<u8>,
}
