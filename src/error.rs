use openssl::error::ErrorStack;
use thiserror::Error;

// Error type shared by key generation, the cipher and the channel
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    GenerationFailure(String),

    // Modulus length refused by the key-size policy, on generation or import
    #[error("Key size rejected: {0}")]
    KeyPolicy(String),

    #[error("Data too large: {size} bytes (max: {max} bytes)")]
    EncodingTooLarge { size: usize, max: usize },

    #[error("Malformed ciphertext: expected {expected} bytes, got {actual}")]
    MalformedCiphertext { expected: usize, actual: usize },

    // Bad padding and wrong key must be indistinguishable here
    #[error("Decryption failed")]
    DecryptionFailure,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid base64 encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("Decrypted data is not valid UTF-8")]
    NotUtf8,

    #[error("Message addressed to {actual}, not {expected}")]
    Misaddressed { expected: String, actual: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Key generation worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] ErrorStack),
}

impl CryptoError {
    /// True when the error comes from bad caller input rather than from a
    /// failed cryptographic check or a backend failure. `GenerationFailure`
    /// is left out: it only carries OpenSSL and entropy failures.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CryptoError::KeyPolicy(_)
                | CryptoError::EncodingTooLarge { .. }
                | CryptoError::MalformedCiphertext { .. }
                | CryptoError::InvalidKey(_)
                | CryptoError::InvalidEncoding(_)
                | CryptoError::NotUtf8
                | CryptoError::Misaddressed { .. }
                | CryptoError::Config(_)
        )
    }
}
