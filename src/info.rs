//! HKDF `info` buffers for the "aesgcm" content encoding.
//!
//! Layout:
//!   "Content-Encoding: " | type | 0x00 | "P-256" | 0x00
//!   | len:u16be | client_key[65] | len:u16be | server_key[65]

use crate::keys::UNCOMPRESSED_POINT_LEN;

/// Standalone info string for the auth-secret extraction step.
pub const AUTH_INFO: &[u8] = b"Content-Encoding: auth\0";

const PREFIX: &[u8] = b"Content-Encoding: ";
const CURVE_LABEL: &[u8] = b"P-256";

/// The two content encodings derived through [`build_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    AesGcm,
    Nonce,
}

impl ContentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::AesGcm => "aesgcm",
            ContentEncoding::Nonce => "nonce",
        }
    }
}

/// Build the context-bound info buffer; `client` is the receiver's key and
/// `server` the sender's, both uncompressed P-256 points.
pub fn build_info(
    encoding: ContentEncoding,
    client: &[u8; UNCOMPRESSED_POINT_LEN],
    server: &[u8; UNCOMPRESSED_POINT_LEN],
) -> Vec<u8> {
    let label = encoding.as_str().as_bytes();
    let key_len = (UNCOMPRESSED_POINT_LEN as u16).to_be_bytes();

    let mut out = Vec::with_capacity(
        PREFIX.len() + label.len() + 1 + CURVE_LABEL.len() + 1 + 2 * (2 + UNCOMPRESSED_POINT_LEN),
    );
    out.extend_from_slice(PREFIX);
    out.extend_from_slice(label);
    out.push(0);
    out.extend_from_slice(CURVE_LABEL);
    out.push(0);
    out.extend_from_slice(&key_len);
    out.extend_from_slice(client);
    out.extend_from_slice(&key_len);
    out.extend_from_slice(server);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aesgcm_layout() {
        let client = [0x11u8; 65];
        let server = [0x22u8; 65];
        let info = build_info(ContentEncoding::AesGcm, &client, &server);

        let header = b"Content-Encoding: aesgcm\0P-256\0";
        assert_eq!(&info[..header.len()], header);
        let rest = &info[header.len()..];
        assert_eq!(&rest[..2], &[0x00, 0x41]);
        assert_eq!(&rest[2..67], &client[..]);
        assert_eq!(&rest[67..69], &[0x00, 0x41]);
        assert_eq!(&rest[69..], &server[..]);
        assert_eq!(info.len(), header.len() + 2 * 67);
    }

    #[test]
    fn nonce_label() {
        let info = build_info(ContentEncoding::Nonce, &[4u8; 65], &[4u8; 65]);
        assert!(info.starts_with(b"Content-Encoding: nonce\0P-256\0"));
        assert_eq!(info.len(), 30 + 134);
    }

    #[test]
    fn auth_info_is_nul_terminated() {
        assert_eq!(AUTH_INFO.last(), Some(&0u8));
        assert_eq!(AUTH_INFO.len(), 23);
    }
}
