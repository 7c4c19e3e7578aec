//! WebPush "aesgcm" decryption pipeline.
//!
//! 1. ECDH(receiver_secret, sender_public) → raw 32-byte shared X coordinate.
//! 2. HKDF(auth_secret, shared, "Content-Encoding: auth\0", 32) → prk.
//! 3. HKDF(salt, prk, info("aesgcm"), 16) → content encryption key.
//! 4. HKDF(salt, prk, info("nonce"), 12) → nonce.
//! 5. AES-128-GCM open of the body (tag is the trailing 16 bytes).
//! 6. Padding removal.
//!
//! Any failing step aborts the whole message.  Nothing is cached between
//! calls; derived material is zeroized when dropped.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Key, Nonce};
use log::{debug, warn};
use p256::PublicKey;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::DecryptOptions;
use crate::header::MessageParams;
use crate::info::{build_info, ContentEncoding, AUTH_INFO};
use crate::kdf::{hkdf_array, HkdfError};
use crate::keys::{decode_public_point, encode_public_point, EcKeyPair, KeyError};
use crate::padding::{strip_padding, PaddingError};
use crate::subscription::SubscriptionKeys;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DecryptError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Kdf(#[from] HkdfError),
    #[error(transparent)]
    Padding(#[from] PaddingError),
    #[error("AES-GCM authentication failed: wrong key material or tampered ciphertext")]
    AuthenticationFailed,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ─── Key material ─────────────────────────────────────────────────────────────

/// Everything derived for one message.  Never logged.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyMaterial {
    pub shared_secret: [u8; 32],
    pub pseudo_random_key: [u8; 32],
    pub content_encryption_key: [u8; 16],
    pub nonce: [u8; 12],
}

impl std::fmt::Debug for DerivedKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKeyMaterial { .. }")
    }
}

/// Steps 1–4: agree on the shared secret and derive the CEK and nonce.
pub fn derive_key_material(
    receiver: &EcKeyPair,
    auth_secret: &[u8],
    salt: &[u8],
    sender_public: &PublicKey,
) -> Result<DerivedKeyMaterial, DecryptError> {
    if auth_secret.is_empty() {
        return Err(DecryptError::InvalidInput("auth secret is empty".into()));
    }
    if salt.is_empty() {
        return Err(DecryptError::InvalidInput("salt is empty".into()));
    }

    let receiver_point = receiver.public_point()?;
    let sender_point = encode_public_point(sender_public)?;

    let shared = p256::ecdh::diffie_hellman(receiver.secret.to_nonzero_scalar(), sender_public.as_affine());
    let mut shared_secret = [0u8; 32];
    shared_secret.copy_from_slice(shared.raw_secret_bytes());

    let pseudo_random_key = hkdf_array::<32>(auth_secret, &shared_secret, AUTH_INFO)?;

    let cek_info = build_info(ContentEncoding::AesGcm, &receiver_point, &sender_point);
    let content_encryption_key = hkdf_array::<16>(salt, &pseudo_random_key, &cek_info)?;

    let nonce_info = build_info(ContentEncoding::Nonce, &receiver_point, &sender_point);
    let nonce = hkdf_array::<12>(salt, &pseudo_random_key, &nonce_info)?;

    Ok(DerivedKeyMaterial {
        shared_secret,
        pseudo_random_key,
        content_encryption_key,
        nonce,
    })
}

/// Step 5: open the AES-128-GCM body.  The tag check is the only integrity
/// check; a body shorter than the tag fails it too.
pub fn decrypt_body(material: &DerivedKeyMaterial, body: &[u8]) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
    let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&material.content_encryption_key));
    let nonce = Nonce::from_slice(&material.nonce);
    cipher
        .decrypt(nonce, body)
        .map(Zeroizing::new)
        .map_err(|_| DecryptError::AuthenticationFailed)
}

// ─── Decryptor ────────────────────────────────────────────────────────────────

/// Stateless decryptor; options are the only thing it carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decryptor {
    options: DecryptOptions,
}

impl Decryptor {
    pub fn new(options: DecryptOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecryptOptions {
        &self.options
    }

    /// Run the full pipeline for one message.
    ///
    /// `sender_public` is the 65-byte uncompressed point from the `dh`
    /// parameter of the `Crypto-Key` header.
    pub fn decrypt(
        &self,
        receiver: &EcKeyPair,
        auth_secret: &[u8],
        salt: &[u8],
        sender_public: &[u8],
        body: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        let sender = decode_public_point(sender_public)?;
        let material = derive_key_material(receiver, auth_secret, salt, &sender)?;

        let raw = decrypt_body(&material, body).inspect_err(|_| {
            warn!(
                "[webpush] authentication failed for {}-byte body from sender {}",
                body.len(),
                fingerprint(sender_public)
            );
        })?;

        let content = strip_padding(&raw, self.options.legacy_whitespace_padding)?;
        debug!(
            "[webpush] decrypted {} bytes ({} after padding) from sender {}",
            raw.len(),
            content.len(),
            fingerprint(sender_public)
        );
        Ok(content.to_vec())
    }

    /// Decrypt with a subscription's stored keys and the header-derived
    /// per-message parameters.
    pub fn decrypt_message(
        &self,
        keys: &SubscriptionKeys,
        params: &MessageParams,
        body: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        self.decrypt(
            keys.key_pair(),
            keys.auth_secret(),
            &params.salt,
            &params.sender_public,
            body,
        )
    }
}

/// Decrypt with default options.
pub fn decrypt(
    receiver: &EcKeyPair,
    auth_secret: &[u8],
    salt: &[u8],
    sender_public: &[u8],
    body: &[u8],
) -> Result<Vec<u8>, DecryptError> {
    Decryptor::default().decrypt(receiver, auth_secret, salt, sender_public, body)
}

/// Short hex prefix of a public key, safe to log.
fn fingerprint(public: &[u8]) -> String {
    hex::encode(&public[..public.len().min(8)])
}

// ─── Tests ────────────────────────────────────────────────────────────────────
