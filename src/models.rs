use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

// Ciphertext in transit between two parties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    pub sender: String,
    pub recipient: String,
    // Always Base64 for encrypted data
    pub ciphertext: String,
}

impl EncryptedMessage {
    pub fn new(sender: &str, recipient: &str, ciphertext: &[u8]) -> Self {
        Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            ciphertext: STANDARD.encode(ciphertext),
        }
    }

    // Convert from Base64 back to binary
    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(STANDARD.decode(&self.ciphertext)?)
    }

    pub fn to_json(&self) -> Result<String, CryptoError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        Ok(serde_json::from_str(json)?)
    }
}
