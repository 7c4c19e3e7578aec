uniffi::include_scaffolding!("webpush_core");

pub mod binpack;
pub mod config;
pub mod decrypt;
pub mod header;
pub mod info;
pub mod kdf;
pub mod keys;
pub mod logging;
pub mod padding;
pub mod subscription;

use std::collections::HashMap;

// ── Re-exports ────────────────────────────────────────────────────────────────
pub use binpack::{BinPackError, Value};
pub use config::DecryptOptions;
pub use decrypt::{decrypt, derive_key_material, DecryptError, Decryptor, DerivedKeyMaterial};
pub use header::{parse_param_string, HeaderError, MessageParams};
pub use kdf::{hkdf, HkdfError};
pub use keys::{
    decode_public_point, decode_raw_scalar, encode_public_point, encode_raw_scalar, generate_keypair,
    EcKeyPair, KeyError,
};
pub use logging::init_logging;
pub use subscription::SubscriptionKeys;

// ── FFI error ─────────────────────────────────────────────────────────────────

/// Errors surfaced through UniFFI to the host app.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("Unsupported curve: {0}")]
    UnsupportedCurve(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("Malformed padding: {0}")]
    MalformedPadding(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<KeyError> for PushError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::UnsupportedCurve(curve) => PushError::UnsupportedCurve(curve),
            other => PushError::InvalidKeyFormat(other.to_string()),
        }
    }
}

impl From<DecryptError> for PushError {
    fn from(e: DecryptError) -> Self {
        match e {
            DecryptError::Key(k) => k.into(),
            DecryptError::AuthenticationFailed => PushError::AuthenticationFailed,
            DecryptError::Padding(p) => PushError::MalformedPadding(p.to_string()),
            DecryptError::Kdf(k) => PushError::InvalidInput(k.to_string()),
            DecryptError::InvalidInput(msg) => PushError::InvalidInput(msg),
        }
    }
}

impl From<HeaderError> for PushError {
    fn from(e: HeaderError) -> Self {
        match e {
            HeaderError::MalformedHeader(msg) => PushError::MalformedHeader(msg),
        }
    }
}

impl From<BinPackError> for PushError {
    fn from(e: BinPackError) -> Self {
        PushError::Serialization(e.to_string())
    }
}

// ── Subscription ──────────────────────────────────────────────────────────────

/// Key material for a new subscription.  The host persists the raw keys and
/// hands `p256dh` / `auth` to the push server.
pub struct SubscriptionFfi {
    /// Raw 32-byte private scalar.  Never logged.
    pub private_key: Vec<u8>,
    /// 65-byte uncompressed public point.
    pub public_key: Vec<u8>,
    pub auth_secret: Vec<u8>,
    pub p256dh: String,
    pub auth: String,
}

pub fn generate_subscription() -> Result<SubscriptionFfi, PushError> {
    let keys = SubscriptionKeys::generate();
    Ok(SubscriptionFfi {
        private_key: keys.key_pair().raw_scalar().to_vec(),
        public_key: keys.key_pair().public_point()?.to_vec(),
        auth_secret: keys.auth_secret().to_vec(),
        p256dh: keys.p256dh_base64url()?,
        auth: keys.auth_base64url(),
    })
}

// ── Decryption ────────────────────────────────────────────────────────────────

/// Result of a header-driven decrypt.  `sender_public` is the key actually
/// used, so the host can keep it as the fallback for servers that omit `dh`.
#[derive(Debug)]
pub struct DecryptedPush {
    pub plaintext: Vec<u8>,
    pub sender_public: Vec<u8>,
}

pub fn decrypt_push_message(
    private_key: Vec<u8>,
    public_key: Option<Vec<u8>>,
    auth_secret: Vec<u8>,
    salt: Vec<u8>,
    sender_public: Vec<u8>,
    body: Vec<u8>,
    options: DecryptOptions,
) -> Result<Vec<u8>, PushError> {
    let keys = SubscriptionKeys::from_parts(&private_key, public_key.as_deref(), &auth_secret)?;
    let params = MessageParams { salt, sender_public };
    Ok(Decryptor::new(options).decrypt_message(&keys, &params, &body)?)
}

#[allow(clippy::too_many_arguments)]
pub fn decrypt_push_with_headers(
    private_key: Vec<u8>,
    public_key: Option<Vec<u8>>,
    auth_secret: Vec<u8>,
    encryption_header: String,
    crypto_key_header: Option<String>,
    fallback_dh: Option<Vec<u8>>,
    body: Vec<u8>,
    options: DecryptOptions,
) -> Result<DecryptedPush, PushError> {
    let keys = SubscriptionKeys::from_parts(&private_key, public_key.as_deref(), &auth_secret)?;
    let params = MessageParams::from_headers(
        &encryption_header,
        crypto_key_header.as_deref(),
        fallback_dh.as_deref(),
    )?;
    let plaintext = Decryptor::new(options).decrypt_message(&keys, &params, &body)?;
    Ok(DecryptedPush {
        plaintext,
        sender_public: params.sender_public,
    })
}

pub fn parse_header_params(header: String) -> HashMap<String, Option<String>> {
    parse_param_string(&header)
}

// ── BinPack ───────────────────────────────────────────────────────────────────

pub fn binpack_from_json(json: String) -> Result<Vec<u8>, PushError> {
    let parsed: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| PushError::Serialization(e.to_string()))?;
    Ok(binpack::encode(&Value::from_json(&parsed))?)
}

pub fn binpack_to_json(packed: Vec<u8>) -> Result<String, PushError> {
    Ok(binpack::decode(&packed)?.to_json().to_string())
}
