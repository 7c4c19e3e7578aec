//! Padding removal for decrypted "aesgcm" records.
//!
//! The draft scheme prefixes content with `pad_len:u16be` followed by
//! `pad_len` zero bytes.  Payloads without that prefix fall back to skipping
//! leading filler bytes (`<= 0x20`) when the legacy shim is enabled.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaddingError {
    #[error("pad length {pad_len} runs past the {len}-byte record")]
    PadLengthOutOfRange { pad_len: usize, len: usize },
}

/// Return the content slice of a decrypted record.
pub fn strip_padding(raw: &[u8], legacy_whitespace: bool) -> Result<&[u8], PaddingError> {
    let start = if raw.len() >= 3 && raw[2] == 0 {
        let pad_len = u16::from_be_bytes([raw[0], raw[1]]) as usize;
        if pad_len + 2 > raw.len() {
            return Err(PaddingError::PadLengthOutOfRange { pad_len, len: raw.len() });
        }
        pad_len + 2
    } else if legacy_whitespace {
        raw.iter().position(|&b| b > 0x20).unwrap_or(raw.len())
    } else {
        0
    };
    Ok(&raw[start..])
}
