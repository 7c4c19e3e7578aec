//! Decryption options, injected per `Decryptor`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecryptOptions {
    /// Skip leading bytes `<= 0x20` when the plaintext does not carry the
    /// two-byte pad length prefix.  Some push servers emit payloads that only
    /// decode with this enabled.
    pub legacy_whitespace_padding: bool,
}

impl Default for DecryptOptions {
    fn default() -> Self {
        Self {
            legacy_whitespace_padding: true,
        }
    }
}

impl DecryptOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
