//! Credential cipher: AES-256-CBC with a process-wide key and IV, hex-encoded.
//!
//! Encryption is deterministic (fixed IV, no per-record salt) and carries no
//! authentication tag. Identical secrets produce identical ciphertext, and a
//! tampered ciphertext can decrypt to wrong data without raising an error.
//! The format matches ciphertext already stored by earlier deployments.

use std::fmt;

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroizing;

use crate::config::CipherConfig;
use crate::error::{CipherError, StartupError};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

#[derive(Clone)]
pub struct CredentialCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
    iv: [u8; IV_LEN],
}

impl CredentialCipher {
    /// Build a cipher from raw key material. Both lengths must be exact.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, StartupError> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| StartupError::InvalidKeyLength {
            name: "ENCRYPTION_KEY",
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| StartupError::InvalidKeyLength {
            name: "IV",
            expected: IV_LEN,
            actual: iv.len(),
        })?;
        Ok(Self {
            key: Zeroizing::new(key),
            iv,
        })
    }

    /// Validate `ENCRYPTION_KEY` and `IV` from config. Called once at startup;
    /// an error here is fatal.
    pub fn from_config(config: &CipherConfig) -> Result<Self, StartupError> {
        let key = config
            .encryption_key
            .as_deref()
            .ok_or(StartupError::MissingKeyMaterial {
                name: "ENCRYPTION_KEY",
                expected: KEY_LEN,
            })?;
        let iv = config.iv.as_deref().ok_or(StartupError::MissingKeyMaterial {
            name: "IV",
            expected: IV_LEN,
        })?;
        Self::new(key.as_bytes(), iv.as_bytes())
    }

    /// Encrypt a secret. Returns lowercase hex.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let ciphertext = Aes256CbcEnc::new(&(*self.key).into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        hex::encode(ciphertext)
    }

    /// Decrypt hex ciphertext produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, ciphertext_hex: &str) -> Result<Zeroizing<String>, CipherError> {
        let bytes = hex::decode(ciphertext_hex.trim())?;
        if bytes.is_empty() || bytes.len() % BLOCK_LEN != 0 {
            return Err(CipherError::InvalidLength(bytes.len()));
        }

        let plaintext = Aes256CbcDec::new(&(*self.key).into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .map(Zeroizing::new)
            .map_err(|_| CipherError::InvalidPadding)?;

        std::str::from_utf8(&plaintext)
            .map(|s| Zeroizing::new(s.to_string()))
            .map_err(|_| CipherError::InvalidUtf8)
    }
}

impl fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialCipher { .. }")
    }
}
