use crate::error::{HavenError, Result};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Timelike, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const IV_LEN: usize = 16;

/// AES-256-CBC cipher for chat messages at rest.
///
/// Wire format is base64(iv || ciphertext) with a fresh random IV per
/// message. Decryption failures are reported as errors; an undecryptable
/// message is never passed off as plaintext.
pub struct MessageCipher {
    key: [u8; 32],
}

impl MessageCipher {
    /// Build a cipher from a 64-hex-character key.
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        if key_hex.len() != 64 {
            return Err(HavenError::Config(
                "encryption key must be 64 hexadecimal characters".to_string(),
            ));
        }

        let bytes = hex::decode(key_hex)
            .map_err(|e| HavenError::Config(format!("encryption key is not hex: {}", e)))?;

        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HavenError::Config("encryption key must be 32 bytes".to_string()))?;

        Ok(Self { key })
    }

    pub fn encrypt(&self, plain_text: &str) -> Result<String> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plain_text.as_bytes());

        let mut out = iv.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<String> {
        let raw = BASE64
            .decode(encrypted.trim())
            .map_err(|e| HavenError::Cipher(format!("not base64: {}", e)))?;

        if raw.len() < IV_LEN + 16 || (raw.len() - IV_LEN) % 16 != 0 {
            return Err(HavenError::Cipher("ciphertext has invalid length".to_string()));
        }

        let (iv, ciphertext) = raw.split_at(IV_LEN);
        let iv: [u8; IV_LEN] = iv
            .try_into()
            .map_err(|_| HavenError::Cipher("bad iv".to_string()))?;

        let plain = Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| {
                HavenError::Cipher("decryption failed: wrong key or corrupt data".to_string())
            })?;

        String::from_utf8(plain)
            .map_err(|_| HavenError::Cipher("decrypted data is not utf-8".to_string()))
    }
}

/// Derive a stable pseudonymous identifier for analytics. The raw user id
/// never reaches the events table.
pub fn anonymous_id(user_id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Round a timestamp down to the hour for analytics storage.
pub fn anonymize_hour(ts: DateTime<Utc>) -> String {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
        .to_rfc3339()
}
