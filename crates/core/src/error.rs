use thiserror::Error;

/// Failures while turning stored ciphertext back into a secret.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("ciphertext is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("ciphertext length {0} is not a whole number of 16-byte blocks")]
    InvalidLength(usize),

    #[error("ciphertext padding is invalid (wrong key/IV or corrupted data)")]
    InvalidPadding,

    #[error("decrypted secret is not valid UTF-8")]
    InvalidUtf8,
}

/// Bad or missing key material. The process must not serve traffic.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StartupError {
    #[error("{name} must be set ({expected} bytes)")]
    MissingKeyMaterial { name: &'static str, expected: usize },

    #[error("{name} must be exactly {expected} bytes, got {actual}")]
    InvalidKeyLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// An engine kind outside the supported set. Carries the offending value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported database type: {0}")]
pub struct UnsupportedEngine(pub String);
