//! Per-subscription key material: the receiver key pair plus the 16-byte
//! auth secret shared with the push server at registration time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::keys::{
    decode_private_key_any, decode_public_key_any, generate_keypair, EcKeyPair, KeyError,
};

pub const AUTH_SECRET_LEN: usize = 16;

#[derive(Clone, Debug)]
pub struct SubscriptionKeys {
    key_pair: EcKeyPair,
    auth_secret: Zeroizing<Vec<u8>>,
}

impl SubscriptionKeys {
    /// Fresh key pair and auth secret for a new subscription.
    pub fn generate() -> Self {
        let mut auth = vec![0u8; AUTH_SECRET_LEN];
        OsRng.fill_bytes(&mut auth);
        Self {
            key_pair: generate_keypair(),
            auth_secret: Zeroizing::new(auth),
        }
    }

    /// Rebuild from stored bytes.  Keys may be raw (32-byte scalar, 65-byte
    /// point) or DER (PKCS#8, SPKI); a stored public key must match the
    /// private key.  The auth secret is checked by the decrypt pipeline.
    pub fn from_parts(
        private_key: &[u8],
        public_key: Option<&[u8]>,
        auth_secret: &[u8],
    ) -> Result<Self, KeyError> {
        let key_pair = EcKeyPair::from_secret(decode_private_key_any(private_key)?);
        if let Some(stored) = public_key {
            if decode_public_key_any(stored)? != key_pair.public {
                return Err(KeyError::InvalidKeyFormat(
                    "stored public key does not belong to the private key".into(),
                ));
            }
        }
        Ok(Self {
            key_pair,
            auth_secret: Zeroizing::new(auth_secret.to_vec()),
        })
    }

    pub fn key_pair(&self) -> &EcKeyPair {
        &self.key_pair
    }

    pub fn auth_secret(&self) -> &[u8] {
        &self.auth_secret
    }

    /// `p256dh` value for the push server registration.
    pub fn p256dh_base64url(&self) -> Result<String, KeyError> {
        Ok(URL_SAFE_NO_PAD.encode(self.key_pair.public_point()?))
    }

    /// `auth` value for the push server registration.
    pub fn auth_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.auth_secret.as_slice())
    }
}
