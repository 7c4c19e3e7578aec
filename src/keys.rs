//! P-256 key codec for WebPush.
//!
//! Public keys travel as SEC1 uncompressed points (`0x04 || X || Y`, the
//! `p256dh` form), private keys as fixed 32-byte big-endian scalars.  Keys at
//! rest may also be PKCS#8 (private) or X.509 SubjectPublicKeyInfo (public)
//! DER, so both forms are accepted on decode.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::spki::{DecodePublicKey, EncodePublicKey};
use p256::pkcs8::{
    AssociatedOid, DecodePrivateKey, EncodePrivateKey, ObjectIdentifier, PrivateKeyInfo,
    SubjectPublicKeyInfoRef,
};
use p256::{FieldBytes, NistP256, PublicKey, SecretKey};
use rand::rngs::OsRng;
use thiserror::Error;

// ─── Constants ────────────────────────────────────────────────────────────────

/// `ceil(256 / 8)` for P-256.
pub const KEY_SIZE_BYTES: usize = 32;
/// `1 + 2 * KEY_SIZE_BYTES`.
pub const UNCOMPRESSED_POINT_LEN: usize = 1 + 2 * KEY_SIZE_BYTES;
const UNCOMPRESSED_INDICATOR: u8 = 0x04;

/// id-ecPublicKey (RFC 5480).
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("unsupported curve {0}, only P-256 is accepted")]
    UnsupportedCurve(String),
    #[error("value too large: {0} bytes does not fit a 32-byte field")]
    ValueTooLarge(usize),
}

// ─── Key pair ─────────────────────────────────────────────────────────────────

/// A subscription's P-256 key pair.
#[derive(Clone, Debug)]
pub struct EcKeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl EcKeyPair {
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    /// The `p256dh` form of the public half.
    pub fn public_point(&self) -> Result<[u8; UNCOMPRESSED_POINT_LEN], KeyError> {
        encode_public_point(&self.public)
    }

    pub fn raw_scalar(&self) -> [u8; KEY_SIZE_BYTES] {
        encode_raw_scalar(&self.secret)
    }
}

/// Generate a fresh P-256 key pair from the OS RNG.
pub fn generate_keypair() -> EcKeyPair {
    EcKeyPair::from_secret(SecretKey::random(&mut OsRng))
}

// ─── Field fitting ────────────────────────────────────────────────────────────

/// Fit a big-endian coordinate into exactly `KEY_SIZE_BYTES`.
///
/// Short values are left-padded with zeros.  A value one byte too long is
/// accepted only when that extra byte is a zero sign byte, which is dropped.
pub fn fit_coordinate(value: &[u8]) -> Result<[u8; KEY_SIZE_BYTES], KeyError> {
    let mut out = [0u8; KEY_SIZE_BYTES];
    match value.len() {
        n if n <= KEY_SIZE_BYTES => out[KEY_SIZE_BYTES - n..].copy_from_slice(value),
        n if n == KEY_SIZE_BYTES + 1 && value[0] == 0 => out.copy_from_slice(&value[1..]),
        n => return Err(KeyError::ValueTooLarge(n)),
    }
    Ok(out)
}

/// Fit a big-endian scalar into exactly `KEY_SIZE_BYTES`: left-pad short
/// values, keep the trailing bytes of long ones.
fn fit_scalar(value: &[u8]) -> [u8; KEY_SIZE_BYTES] {
    let mut out = [0u8; KEY_SIZE_BYTES];
    if value.len() <= KEY_SIZE_BYTES {
        out[KEY_SIZE_BYTES - value.len()..].copy_from_slice(value);
    } else {
        out.copy_from_slice(&value[value.len() - KEY_SIZE_BYTES..]);
    }
    out
}

// ─── Uncompressed point ───────────────────────────────────────────────────────

/// Build `0x04 || X || Y` from raw big-endian coordinates.
pub fn encode_point_coordinates(x: &[u8], y: &[u8]) -> Result<[u8; UNCOMPRESSED_POINT_LEN], KeyError> {
    let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
    out[0] = UNCOMPRESSED_INDICATOR;
    out[1..1 + KEY_SIZE_BYTES].copy_from_slice(&fit_coordinate(x)?);
    out[1 + KEY_SIZE_BYTES..].copy_from_slice(&fit_coordinate(y)?);
    Ok(out)
}

pub fn encode_public_point(public: &PublicKey) -> Result<[u8; UNCOMPRESSED_POINT_LEN], KeyError> {
    let point = public.to_encoded_point(false);
    match (point.x(), point.y()) {
        (Some(x), Some(y)) => encode_point_coordinates(x, y),
        _ => Err(KeyError::InvalidKeyFormat("public key has no affine coordinates".into())),
    }
}

pub fn decode_public_point(bytes: &[u8]) -> Result<PublicKey, KeyError> {
    if bytes.len() != UNCOMPRESSED_POINT_LEN {
        return Err(KeyError::InvalidKeyFormat(format!(
            "uncompressed point must be {UNCOMPRESSED_POINT_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    if bytes[0] != UNCOMPRESSED_INDICATOR {
        return Err(KeyError::InvalidKeyFormat(format!(
            "uncompressed point must start with 0x04, got {:#04x}",
            bytes[0]
        )));
    }
    PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| KeyError::InvalidKeyFormat("point is not on P-256".into()))
}

// ─── Raw scalar ───────────────────────────────────────────────────────────────

pub fn encode_raw_scalar(secret: &SecretKey) -> [u8; KEY_SIZE_BYTES] {
    fit_scalar(&secret.to_bytes())
}

pub fn decode_raw_scalar(bytes: &[u8]) -> Result<SecretKey, KeyError> {
    if bytes.is_empty() {
        return Err(KeyError::InvalidKeyFormat("empty private key".into()));
    }
    let raw = fit_scalar(bytes);
    SecretKey::from_bytes(&FieldBytes::from(raw))
        .map_err(|_| KeyError::InvalidKeyFormat("scalar is zero or not below the curve order".into()))
}

// ─── DER (PKCS#8 / SPKI) ──────────────────────────────────────────────────────

fn check_curve(algorithm: ObjectIdentifier, parameters: Option<ObjectIdentifier>) -> Result<(), KeyError> {
    if algorithm != EC_PUBLIC_KEY_OID {
        return Err(KeyError::InvalidKeyFormat(format!("not an EC key (algorithm {algorithm})")));
    }
    match parameters {
        Some(curve) if curve == NistP256::OID => Ok(()),
        Some(curve) => Err(KeyError::UnsupportedCurve(curve.to_string())),
        None => Err(KeyError::InvalidKeyFormat("EC key without named curve".into())),
    }
}

/// Decode a PKCS#8 DER private key.
pub fn decode_private_key_der(der: &[u8]) -> Result<SecretKey, KeyError> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| KeyError::InvalidKeyFormat(format!("PKCS#8: {e}")))?;
    check_curve(info.algorithm.oid, info.algorithm.parameters_oid().ok())?;
    SecretKey::from_pkcs8_der(der).map_err(|e| KeyError::InvalidKeyFormat(format!("PKCS#8: {e}")))
}

/// Decode an X.509 SubjectPublicKeyInfo DER public key.
pub fn decode_public_key_der(der: &[u8]) -> Result<PublicKey, KeyError> {
    let info = SubjectPublicKeyInfoRef::try_from(der)
        .map_err(|e| KeyError::InvalidKeyFormat(format!("SPKI: {e}")))?;
    check_curve(info.algorithm.oid, info.algorithm.parameters_oid().ok())?;
    PublicKey::from_public_key_der(der).map_err(|e| KeyError::InvalidKeyFormat(format!("SPKI: {e}")))
}

pub fn encode_private_key_der(secret: &SecretKey) -> Result<Vec<u8>, KeyError> {
    secret
        .to_pkcs8_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| KeyError::InvalidKeyFormat(format!("PKCS#8 encode: {e}")))
}

pub fn encode_public_key_der(public: &PublicKey) -> Result<Vec<u8>, KeyError> {
    public
        .to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| KeyError::InvalidKeyFormat(format!("SPKI encode: {e}")))
}

/// Raw scalar (up to 33 bytes, sign byte included) or PKCS#8 DER.
pub fn decode_private_key_any(bytes: &[u8]) -> Result<SecretKey, KeyError> {
    if bytes.len() <= KEY_SIZE_BYTES + 1 {
        decode_raw_scalar(bytes)
    } else {
        decode_private_key_der(bytes)
    }
}

/// Uncompressed point or SPKI DER.
pub fn decode_public_key_any(bytes: &[u8]) -> Result<PublicKey, KeyError> {
    if bytes.len() == UNCOMPRESSED_POINT_LEN && bytes[0] == UNCOMPRESSED_INDICATOR {
        decode_public_point(bytes)
    } else {
        decode_public_key_der(bytes)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const P384_SPKI_HEX: &str = "3076301006072a8648ce3d020106052b81040022036200042948de311f802576e78a30af8d656b1cb743fe25eb2065a5a5b2c66298f10f906b47ced0a958ab898b199f81950f49328de5f4e0659b00d02a24eb8f9d18eada39ed9e74d7ce368b8d4296b1eede1aeadf70fe4f7fffd677ffed8dce6ce518ba";
    const P384_PKCS8_HEX: &str = "3081b6020100301006072a8648ce3d020106052b8104002204819e30819b0201010430e9614813fc02e4a933c40cc1b771ae01b95af50712cddd0fa9f60fe292d3840e8b96e231e9812e5ced10079770014a25a164036200042948de311f802576e78a30af8d656b1cb743fe25eb2065a5a5b2c66298f10f906b47ced0a958ab898b199f81950f49328de5f4e0659b00d02a24eb8f9d18eada39ed9e74d7ce368b8d4296b1eede1aeadf70fe4f7fffd677ffed8dce6ce518ba";

    // Receiver key from the WebPush known-answer vector, in both forms.
    const RECEIVER_PKCS8_HEX: &str = "308187020100301306072a8648ce3d020106082a8648ce3d030107046d306b0201010420ab5757a70dd4a53e553a6bbf71ffefea2874ec07a6b379e3c48f895a02dc33dea144034200042571b2becdfde360551aaf1ed0f4cd366c11cebe555f89bcb7b186a53339173168ece2ebe018597bd30479b86e3c8f8eced577ca59187e9246990db682008b0e";
    const RECEIVER_SPKI_HEX: &str = "3059301306072a8648ce3d020106082a8648ce3d030107034200042571b2becdfde360551aaf1ed0f4cd366c11cebe555f89bcb7b186a53339173168ece2ebe018597bd30479b86e3c8f8eced577ca59187e9246990db682008b0e";
    const RECEIVER_SCALAR_HEX: &str = "ab5757a70dd4a53e553a6bbf71ffefea2874ec07a6b379e3c48f895a02dc33de";

    #[test]
    fn raw_scalar_roundtrip() {
        for _ in 0..16 {
            let kp = generate_keypair();
            let raw = encode_raw_scalar(&kp.secret);
            let back = decode_raw_scalar(&raw).unwrap();
            assert_eq!(back.to_bytes(), kp.secret.to_bytes());
        }
    }

    #[test]
    fn uncompressed_point_roundtrip() {
        for _ in 0..16 {
            let kp = generate_keypair();
            let point = kp.public_point().unwrap();
            assert_eq!(point.len(), UNCOMPRESSED_POINT_LEN);
            assert_eq!(point[0], 0x04);
            assert_eq!(decode_public_point(&point).unwrap(), kp.public);
        }
    }

    #[test]
    fn decode_point_rejects_bad_length_and_prefix() {
        let point = generate_keypair().public_point().unwrap();

        assert!(matches!(decode_public_point(&point[..64]), Err(KeyError::InvalidKeyFormat(_))));

        let mut longer = point.to_vec();
        longer.push(0);
        assert!(matches!(decode_public_point(&longer), Err(KeyError::InvalidKeyFormat(_))));

        let mut compressed_tag = point;
        compressed_tag[0] = 0x02;
        assert!(matches!(decode_public_point(&compressed_tag), Err(KeyError::InvalidKeyFormat(_))));
    }

    #[test]
    fn decode_point_rejects_off_curve() {
        let mut point = generate_keypair().public_point().unwrap();
        point[64] ^= 0x01;
        assert!(matches!(decode_public_point(&point), Err(KeyError::InvalidKeyFormat(_))));
    }

    #[test]
    fn fit_coordinate_pads_and_strips_sign_byte() {
        let short = fit_coordinate(&[0xAB, 0xCD]).unwrap();
        assert_eq!(&short[..30], &[0u8; 30]);
        assert_eq!(&short[30..], &[0xAB, 0xCD]);

        let mut signed = vec![0u8];
        signed.extend_from_slice(&[0xFF; 32]);
        assert_eq!(fit_coordinate(&signed).unwrap(), [0xFF; 32]);

        let mut not_sign = vec![0x01];
        not_sign.extend_from_slice(&[0xFF; 32]);
        assert!(matches!(fit_coordinate(&not_sign), Err(KeyError::ValueTooLarge(33))));
        assert!(matches!(fit_coordinate(&[0u8; 34]), Err(KeyError::ValueTooLarge(34))));
    }

    #[test]
    fn encode_point_coordinates_matches_sec1() {
        let kp = generate_keypair();
        let sec1 = kp.public.to_encoded_point(false);
        let x = sec1.x().unwrap();
        let y = sec1.y().unwrap();

        // Sign-byte-prefixed X (as a two's-complement encoder would emit it).
        let mut signed_x = vec![0u8];
        signed_x.extend_from_slice(x);
        let point = encode_point_coordinates(&signed_x, y).unwrap();
        assert_eq!(&point[..], sec1.as_bytes());
    }

    #[test]
    fn raw_scalar_pads_short_and_truncates_long() {
        let scalar = hex::decode(RECEIVER_SCALAR_HEX).unwrap();

        let mut with_sign = vec![0u8];
        with_sign.extend_from_slice(&scalar);
        let a = decode_raw_scalar(&with_sign).unwrap();
        assert_eq!(a.to_bytes().as_slice(), scalar.as_slice());

        let mut small = [0u8; 32];
        small[31] = 7;
        let b = decode_raw_scalar(&[7]).unwrap();
        assert_eq!(encode_raw_scalar(&b), small);
    }

    #[test]
    fn raw_scalar_rejects_zero_and_empty() {
        assert!(matches!(decode_raw_scalar(&[0u8; 32]), Err(KeyError::InvalidKeyFormat(_))));
        assert!(matches!(decode_raw_scalar(&[]), Err(KeyError::InvalidKeyFormat(_))));
        assert!(matches!(decode_raw_scalar(&[0xFF; 32]), Err(KeyError::InvalidKeyFormat(_))));
    }

    #[test]
    fn der_forms_decode_to_same_key() {
        let from_der = decode_private_key_der(&hex::decode(RECEIVER_PKCS8_HEX).unwrap()).unwrap();
        let from_raw = decode_raw_scalar(&hex::decode(RECEIVER_SCALAR_HEX).unwrap()).unwrap();
        assert_eq!(from_der.to_bytes(), from_raw.to_bytes());

        let public = decode_public_key_der(&hex::decode(RECEIVER_SPKI_HEX).unwrap()).unwrap();
        assert_eq!(public, from_raw.public_key());
    }

    #[test]
    fn der_roundtrip() {
        let kp = generate_keypair();
        let priv_der = encode_private_key_der(&kp.secret).unwrap();
        let pub_der = encode_public_key_der(&kp.public).unwrap();
        assert_eq!(decode_private_key_der(&priv_der).unwrap().to_bytes(), kp.secret.to_bytes());
        assert_eq!(decode_public_key_der(&pub_der).unwrap(), kp.public);
    }

    #[test]
    fn other_curves_are_unsupported() {
        let spki = hex::decode(P384_SPKI_HEX).unwrap();
        assert!(matches!(decode_public_key_der(&spki), Err(KeyError::UnsupportedCurve(_))));

        let pkcs8 = hex::decode(P384_PKCS8_HEX).unwrap();
        assert!(matches!(decode_private_key_der(&pkcs8), Err(KeyError::UnsupportedCurve(_))));
    }

    #[test]
    fn any_decoders_accept_both_forms() {
        let kp = generate_keypair();
        let raw = kp.raw_scalar();
        let der = encode_private_key_der(&kp.secret).unwrap();
        assert_eq!(decode_private_key_any(&raw).unwrap().to_bytes(), kp.secret.to_bytes());
        assert_eq!(decode_private_key_any(&der).unwrap().to_bytes(), kp.secret.to_bytes());

        let point = kp.public_point().unwrap();
        let spki = encode_public_key_der(&kp.public).unwrap();
        assert_eq!(decode_public_key_any(&point).unwrap(), kp.public);
        assert_eq!(decode_public_key_any(&spki).unwrap(), kp.public);

        assert!(decode_public_key_any(b"garbage").is_err());
    }
}
