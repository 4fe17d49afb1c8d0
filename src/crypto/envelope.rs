// src/crypto/envelope.rs
// AES-256-GCM envelope scheme (spec §4.7, §8 property 5).

use base64::Engine;
use openssl::rand::rand_bytes;
use openssl::symm::{decrypt_aead, encrypt_aead, Cipher};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NONCE_LEN: usize = 12;
const DEK_LEN: usize = 32;
const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid KEK: must be 32 bytes, got {0}")]
    InvalidKek(usize),

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(i64),

    #[error("envelope decryption failed")]
    DecryptionFailed,

    #[error(transparent)]
    Crypto(#[from] openssl::error::ErrorStack),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub v: i64,
    pub cipher: String,
    pub dek_wrap: String,
    pub nonce: String,
    pub ciphertext: String,
    pub wrap_nonce: String,
    pub wrapped_dek: String,
}

fn b64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn b64_decode(s: &str) -> Result<Vec<u8>, EnvelopeError> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|_| EnvelopeError::DecryptionFailed)
}

fn decode_kek(kek_b64: &str) -> Result<Vec<u8>, EnvelopeError> {
    let kek = base64::engine::general_purpose::STANDARD
        .decode(kek_b64)
        .map_err(|_| EnvelopeError::InvalidKek(0))?;
    if kek.len() != DEK_LEN {
        return Err(EnvelopeError::InvalidKek(kek.len()));
    }
    Ok(kek)
}

/// Seal a plaintext buffer under a one-time DEK, then wrap the DEK under the
/// KEK. Ciphertext/tag are concatenated (tag last) before base64-encoding,
/// matching the convention AES-GCM implementations commonly use when there's
/// no separate "tag" field in the wire format.
fn seal_bytes(kek: &[u8], plaintext: &[u8]) -> Result<Envelope, EnvelopeError> {
    let cipher = Cipher::aes_256_gcm();

    let mut dek = vec![0u8; DEK_LEN];
    rand_bytes(&mut dek)?;

    let mut data_nonce = vec![0u8; NONCE_LEN];
    rand_bytes(&mut data_nonce)?;
    let mut data_tag = [0u8; TAG_LEN];
    let ciphertext = encrypt_aead(cipher, &dek, Some(&data_nonce), &[], plaintext, &mut data_tag)?;
    let mut sealed = ciphertext;
    sealed.extend_from_slice(&data_tag);

    let mut wrap_nonce = vec![0u8; NONCE_LEN];
    rand_bytes(&mut wrap_nonce)?;
    let mut wrap_tag = [0u8; TAG_LEN];
    let wrapped = encrypt_aead(cipher, kek, Some(&wrap_nonce), &[], &dek, &mut wrap_tag)?;
    let mut wrapped_dek = wrapped;
    wrapped_dek.extend_from_slice(&wrap_tag);

    Ok(Envelope {
        v: 1,
        cipher: "AES-256-GCM".to_string(),
        dek_wrap: "KEK-AES-GCM".to_string(),
        nonce: b64_encode(&data_nonce),
        ciphertext: b64_encode(&sealed),
        wrap_nonce: b64_encode(&wrap_nonce),
        wrapped_dek: b64_encode(&wrapped_dek),
    })
}

fn open_bytes(kek: &[u8], envelope: &Envelope) -> Result<Vec<u8>, EnvelopeError> {
    if envelope.v != 1 {
        return Err(EnvelopeError::UnsupportedVersion(envelope.v));
    }

    let cipher = Cipher::aes_256_gcm();

    let wrap_nonce = b64_decode(&envelope.wrap_nonce)?;
    let wrapped = b64_decode(&envelope.wrapped_dek)?;
    if wrapped.len() < TAG_LEN {
        return Err(EnvelopeError::DecryptionFailed);
    }
    let (wrapped_dek, wrap_tag) = wrapped.split_at(wrapped.len() - TAG_LEN);
    let dek = decrypt_aead(cipher, kek, Some(&wrap_nonce), &[], wrapped_dek, wrap_tag)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    let data_nonce = b64_decode(&envelope.nonce)?;
    let sealed = b64_decode(&envelope.ciphertext)?;
    if sealed.len() < TAG_LEN {
        return Err(EnvelopeError::DecryptionFailed);
    }
    let (ciphertext, data_tag) = sealed.split_at(sealed.len() - TAG_LEN);
    let plaintext = decrypt_aead(cipher, &dek, Some(&data_nonce), &[], ciphertext, data_tag)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    Ok(plaintext)
}

/// Seal a list of credentials into the JSON-serialized envelope form stored
/// in `providers.api_keys_encrypted`.
pub fn seal_credentials(kek_b64: &str, credentials: &[String]) -> Result<String, EnvelopeError> {
    let kek = decode_kek(kek_b64)?;
    let plaintext = serde_json::to_vec(credentials).map_err(|_| EnvelopeError::DecryptionFailed)?;
    let envelope = seal_bytes(&kek, &plaintext)?;
    serde_json::to_string(&envelope).map_err(|_| EnvelopeError::DecryptionFailed)
}

/// Open a stored credential blob. Three outcomes, all per spec §4.7/§7:
/// - a valid `v:1` envelope decrypts to the original list;
/// - a value that parses as a bare JSON array is legacy plaintext, returned
///   as-is (no upgrade-on-read);
/// - anything else (corrupt row, failed decryption) yields an empty list so
///   one bad row never crashes a pull.
pub fn open_credentials(kek_b64: &str, stored: &str) -> Vec<String> {
    if stored.is_empty() || stored == "[]" {
        return Vec::new();
    }

    let Ok(kek) = decode_kek(kek_b64) else {
        return Vec::new();
    };

    match serde_json::from_str::<Envelope>(stored) {
        Ok(envelope) if envelope.v == 1 => open_bytes(&kek, &envelope)
            .ok()
            .and_then(|plaintext| serde_json::from_slice::<Vec<String>>(&plaintext).ok())
            .unwrap_or_default(),
        _ => serde_json::from_str::<Vec<String>>(stored).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_kek() -> String {
        base64::engine::general_purpose::STANDARD.encode([7u8; 32])
    }

    #[test]
    fn round_trips_credentials() {
        let kek = test_kek();
        let creds = vec!["sk-test-1".to_string(), "sk-test-2".to_string()];

        let sealed = seal_credentials(&kek, &creds).unwrap();
        let envelope: Envelope = serde_json::from_str(&sealed).unwrap();
        assert_eq!(envelope.v, 1);

        let opened = open_credentials(&kek, &sealed);
        assert_eq!(opened, creds);
    }

    #[test]
    fn rejects_tampered_ciphertext() {
        let kek = test_kek();
        let sealed = seal_credentials(&kek, &["sk-a".to_string()]).unwrap();
        let mut envelope: Envelope = serde_json::from_str(&sealed).unwrap();

        let mut raw = b64_decode(&envelope.ciphertext).unwrap();
        raw[0] ^= 0xff;
        envelope.ciphertext = b64_encode(&raw);

        let tampered = serde_json::to_string(&envelope).unwrap();
        assert_eq!(open_credentials(&kek, &tampered), Vec::<String>::new());
    }

    #[test]
    fn rejects_wrong_kek() {
        let kek_a = test_kek();
        let kek_b = base64::engine::general_purpose::STANDARD.encode([9u8; 32]);
        let sealed = seal_credentials(&kek_a, &["sk-a".to_string()]).unwrap();

        assert_eq!(open_credentials(&kek_b, &sealed), Vec::<String>::new());
    }

    #[test]
    fn legacy_plaintext_array_passes_through() {
        let kek = test_kek();
        let legacy = serde_json::to_string(&vec!["sk-legacy".to_string()]).unwrap();
        assert_eq!(open_credentials(&kek, &legacy), vec!["sk-legacy".to_string()]);
    }

    #[test]
    fn corrupt_value_yields_empty_list() {
        let kek = test_kek();
        assert_eq!(open_credentials(&kek, "not json at all"), Vec::<String>::new());
    }

    #[test]
    fn empty_sentinel_yields_empty_list() {
        let kek = test_kek();
        assert_eq!(open_credentials(&kek, "[]"), Vec::<String>::new());
        assert_eq!(open_credentials(&kek, ""), Vec::<String>::new());
    }
}
