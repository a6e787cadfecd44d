//! A pure Rust backend for the `ece` crate.
//!
//! `ece` only ships an OpenSSL backend. Everything it needs for `aes128gcm`
//! (P-256 ECDH, HKDF-SHA256, AES-128-GCM and randomness) is provided here by the
//! RustCrypto crates instead, and registered once per process with [`install`].

use std::{any::Any, fmt, sync::Once};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use base64::Engine;
use ece::{
    crypto::{Cryptographer, EcKeyComponents, LocalKeyPair, RemotePublicKey},
    *,
};
use hkdf::Hkdf;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::RngCore;
use sha2::Sha256;

const AES_GCM_TAG_LENGTH: usize = 16;

#[derive(Clone, Debug)]
pub struct CryptoRemotePublicKey {
    public_key: PublicKey,
}

impl CryptoRemotePublicKey {
    fn from_raw(raw: &[u8]) -> Result<Self> {
        // rejects points that are not on the curve
        let public_key = PublicKey::from_sec1_bytes(raw).map_err(|_| Error::CryptoError)?;
        Ok(CryptoRemotePublicKey { public_key })
    }
}

impl RemotePublicKey for CryptoRemotePublicKey {
    fn as_raw(&self) -> Result<Vec<u8>> {
        Ok(self.public_key.to_encoded_point(false).as_bytes().to_vec())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone)]
pub struct CryptoLocalKeyPair {
    secret_key: SecretKey,
}

impl fmt::Debug for CryptoLocalKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the private scalar
        let public = self.pub_as_raw().unwrap_or_default();
        write!(
            f,
            "CryptoLocalKeyPair({})",
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(public)
        )
    }
}

impl CryptoLocalKeyPair {
    fn generate_random() -> Self {
        CryptoLocalKeyPair {
            secret_key: SecretKey::random(&mut rand::thread_rng()),
        }
    }

    fn from_raw_components(components: &EcKeyComponents) -> Result<Self> {
        let secret_key =
            SecretKey::from_slice(components.private_key()).map_err(|_| Error::CryptoError)?;

        let expected = secret_key.public_key().to_encoded_point(false);
        if expected.as_bytes() != components.public_key() {
            return Err(Error::CryptoError);
        }

        Ok(CryptoLocalKeyPair { secret_key })
    }
}

impl LocalKeyPair for CryptoLocalKeyPair {
    /// Export the public key component in the binary uncompressed point representation.
    fn pub_as_raw(&self) -> Result<Vec<u8>> {
        Ok(self
            .secret_key
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec())
    }

    fn raw_components(&self) -> Result<EcKeyComponents> {
        Ok(EcKeyComponents::new(
            self.secret_key.to_bytes().to_vec(),
            self.pub_as_raw()?,
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct LocalCryptographer;

impl Cryptographer for LocalCryptographer {
    fn generate_ephemeral_keypair(&self) -> Result<Box<dyn LocalKeyPair>> {
        Ok(Box::new(CryptoLocalKeyPair::generate_random()))
    }

    fn import_key_pair(&self, components: &EcKeyComponents) -> Result<Box<dyn LocalKeyPair>> {
        Ok(Box::new(CryptoLocalKeyPair::from_raw_components(
            components,
        )?))
    }

    fn import_public_key(&self, raw: &[u8]) -> Result<Box<dyn RemotePublicKey>> {
        Ok(Box::new(CryptoRemotePublicKey::from_raw(raw)?))
    }

    fn compute_ecdh_secret(
        &self,
        remote: &dyn RemotePublicKey,
        local: &dyn LocalKeyPair,
    ) -> Result<Vec<u8>> {
        let local = local
            .as_any()
            .downcast_ref::<CryptoLocalKeyPair>()
            .ok_or(Error::CryptoError)?;
        let remote = remote
            .as_any()
            .downcast_ref::<CryptoRemotePublicKey>()
            .ok_or(Error::CryptoError)?;

        let shared = p256::ecdh::diffie_hellman(
            local.secret_key.to_nonzero_scalar(),
            remote.public_key.as_affine(),
        );
        Ok(shared.raw_secret_bytes().to_vec())
    }

    fn hkdf_sha256(&self, salt: &[u8], secret: &[u8], info: &[u8], len: usize) -> Result<Vec<u8>> {
        let (_, hk) = Hkdf::<Sha256>::extract(Some(salt), secret);
        let mut okm = vec![0u8; len];
        hk.expand(info, &mut okm).map_err(|_| Error::CryptoError)?;
        Ok(okm)
    }

    fn aes_gcm_128_encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| Error::CryptoError)?;
        // the tag is appended to the ciphertext
        cipher
            .encrypt(Nonce::from_slice(iv), data)
            .map_err(|_| Error::CryptoError)
    }

    fn aes_gcm_128_decrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        ciphertext_and_tag: &[u8],
    ) -> Result<Vec<u8>> {
        if ciphertext_and_tag.len() < AES_GCM_TAG_LENGTH {
            return Err(Error::CryptoError);
        }
        let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| Error::CryptoError)?;
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext_and_tag)
            .map_err(|_| Error::CryptoError)
    }

    fn random_bytes(&self, dest: &mut [u8]) -> Result<()> {
        rand::thread_rng()
            .try_fill_bytes(dest)
            .map_err(|_| Error::CryptoError)
    }
}

static CRYPTOGRAPHER: LocalCryptographer = LocalCryptographer;
static INSTALL: Once = Once::new();

/// Registers [`LocalCryptographer`] as the `ece` backend. Safe to call repeatedly.
pub fn install() {
    INSTALL.call_once(|| {
        if ece::crypto::set_cryptographer(&CRYPTOGRAPHER).is_err() {
            debug!("An ece cryptographer was already registered, keeping it");
        }
    });
}
