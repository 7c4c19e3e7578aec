//! Single-block HKDF-SHA256 (RFC 5869 extract + one expand round).
//!
//! Every WebPush derivation asks for at most one SHA-256 block, so output
//! longer than 32 bytes is refused instead of running the multi-block loop.

use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

/// SHA-256 digest size; the most a single expand round can produce.
pub const MAX_OUTPUT_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum HkdfError {
    #[error("HKDF output of {0} bytes requested, at most 32 supported")]
    OutputTooLong(usize),
}

/// `HMAC-SHA256(HMAC-SHA256(salt, ikm), info || 0x01)[..length]`.
pub fn hkdf(salt: &[u8], ikm: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>, HkdfError> {
    let mut okm = vec![0u8; length];
    hkdf_into(salt, ikm, info, &mut okm)?;
    Ok(okm)
}

/// Fixed-size variant for the pipeline's 32/16/12-byte outputs.
pub fn hkdf_array<const N: usize>(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<[u8; N], HkdfError> {
    let mut okm = [0u8; N];
    hkdf_into(salt, ikm, info, &mut okm)?;
    Ok(okm)
}

/// Fill `okm` from one expand round.  Nothing is written when `okm` is
/// longer than a single block.
fn hkdf_into(salt: &[u8], ikm: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), HkdfError> {
    if okm.len() > MAX_OUTPUT_LEN {
        return Err(HkdfError::OutputTooLong(okm.len()));
    }
    Hkdf::<Sha256>::new(Some(salt), ikm)
        .expand(info, okm)
        .map_err(|_| HkdfError::OutputTooLong(okm.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = hkdf(b"salt", b"ikm", b"info", 32).unwrap();
        let b = hkdf(b"salt", b"ikm", b"info", 32).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, hkdf(b"salt", b"ikm", b"other", 32).unwrap());
    }

    #[test]
    fn shorter_output_is_prefix() {
        let full = hkdf(b"salt", b"ikm", b"info", 32).unwrap();
        let short = hkdf(b"salt", b"ikm", b"info", 12).unwrap();
        assert_eq!(&full[..12], short.as_slice());
        assert!(hkdf(b"salt", b"ikm", b"info", 0).unwrap().is_empty());
    }

    #[test]
    fn rejects_more_than_one_block() {
        assert!(matches!(hkdf(b"s", b"k", b"i", 33), Err(HkdfError::OutputTooLong(33))));
        assert!(matches!(hkdf_array::<64>(b"s", b"k", b"i"), Err(HkdfError::OutputTooLong(64))));
    }

    #[test]
    fn rfc5869_case_1_first_block() {
        let ikm = [0x0b; 22];
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();
        let okm = hkdf(&salt, &ikm, &info, 32).unwrap();
        assert_eq!(
            hex::encode(okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf"
        );
    }

    #[test]
    fn array_matches_vec() {
        let v = hkdf(b"salt", b"ikm", b"info", 16).unwrap();
        let a: [u8; 16] = hkdf_array(b"salt", b"ikm", b"info").unwrap();
        assert_eq!(v.as_slice(), &a);
    }
}
