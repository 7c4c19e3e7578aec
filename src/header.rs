//! `Crypto-Key` / `Encryption` header parsing.
//!
//! Both headers are `key=value` pairs separated by `;`, e.g.
//! `Crypto-Key: dh=<b64url>;p256ecdsa=<b64url>` and
//! `Encryption: salt=<b64url>`.

use std::collections::HashMap;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("malformed header: {0}")]
    MalformedHeader(String),
}

/// Split a parameter string into a key → value map.
///
/// Segments without `=` map to `None`; empty segments are skipped; the last
/// occurrence of a key wins.
pub fn parse_param_string(s: &str) -> HashMap<String, Option<String>> {
    let mut params = HashMap::new();
    for segment in s.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, value)) => params.insert(key.trim().to_string(), Some(value.trim().to_string())),
            None => params.insert(segment.to_string(), None),
        };
    }
    params
}

/// Decode base64url with or without `=` padding.
pub fn decode_base64url(s: &str) -> Result<Vec<u8>, HeaderError> {
    let s = s.trim();
    let decoded = if s.ends_with('=') {
        URL_SAFE.decode(s)
    } else {
        URL_SAFE_NO_PAD.decode(s)
    };
    decoded.map_err(|e| HeaderError::MalformedHeader(format!("invalid base64url: {e}")))
}

/// Per-message parameters carried by the transport headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageParams {
    pub salt: Vec<u8>,
    /// Sender's uncompressed P-256 point.
    pub sender_public: Vec<u8>,
}

impl MessageParams {
    /// Extract `salt` from `Encryption` and `dh` from `Crypto-Key`.
    ///
    /// Some servers omit `dh` once it has been sent; `fallback_dh` is the
    /// previously seen sender key (raw bytes) used in that case.
    pub fn from_headers(
        encryption: &str,
        crypto_key: Option<&str>,
        fallback_dh: Option<&[u8]>,
    ) -> Result<Self, HeaderError> {
        let salt = match parse_param_string(encryption).remove("salt").flatten() {
            Some(v) => decode_base64url(&v)?,
            None => return Err(HeaderError::MalformedHeader("Encryption header has no salt".into())),
        };
        if salt.is_empty() {
            return Err(HeaderError::MalformedHeader("salt is empty".into()));
        }

        let dh = crypto_key.and_then(|h| parse_param_string(h).remove("dh").flatten());
        let sender_public = match (dh, fallback_dh) {
            (Some(v), _) => decode_base64url(&v)?,
            (None, Some(cached)) => cached.to_vec(),
            (None, None) => {
                return Err(HeaderError::MalformedHeader(
                    "Crypto-Key has no dh and no previous sender key is known".into(),
                ))
            }
        };

        Ok(Self { salt, sender_public })
    }
}
