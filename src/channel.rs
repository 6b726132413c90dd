use std::fmt;
use tracing::info;

use crate::cipher::{decrypt, encrypt};
use crate::config::{ChannelConfig, PaddingScheme};
use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};
use crate::models::EncryptedMessage;

/// A named participant holding its own key pair.
#[derive(Debug)]
pub struct Party {
    name: String,
    keys: KeyPair,
    config: ChannelConfig,
}

impl Party {
    pub fn new(name: &str, config: &ChannelConfig) -> Result<Self, CryptoError> {
        let keys = KeyPair::generate(config.modulus_bits, config)?;
        Ok(Self::with_keys(name, keys, config.clone()))
    }

    // Same as `new`, but key generation runs on a blocking worker
    pub async fn spawn(name: &str, config: ChannelConfig) -> Result<Self, CryptoError> {
        let keys = KeyPair::generate_blocking_task(config.modulus_bits, config.clone()).await?;
        Ok(Self::with_keys(name, keys, config))
    }

    pub fn with_keys(name: &str, keys: KeyPair, config: ChannelConfig) -> Self {
        Self {
            name: name.to_string(),
            keys,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keys.public
    }

    // Public key in the configured container format
    pub fn export_public_key(&self) -> Result<Vec<u8>, CryptoError> {
        self.keys.public.to_encoded(self.config.key_encoding)
    }

    /// Printable form of `export_public_key`: PEM as is, DER as base64.
    pub fn public_key_text(&self) -> Result<String, CryptoError> {
        self.keys.public.to_text(self.config.key_encoding)
    }

    /// Encrypts `text` for `recipient` under the recipient's public key.
    pub fn send(&self, recipient: &Party, text: &str) -> Result<EncryptedMessage, CryptoError> {
        let ciphertext = encrypt(recipient.public_key(), text.as_bytes(), self.config.padding)?;
        info!(from = %self.name, to = %recipient.name, "message encrypted");
        Ok(EncryptedMessage::new(&self.name, &recipient.name, &ciphertext))
    }

    pub fn receive(&self, message: &EncryptedMessage) -> Result<String, CryptoError> {
        if message.recipient != self.name {
            return Err(CryptoError::Misaddressed {
                expected: self.name.clone(),
                actual: message.recipient.clone(),
            });
        }

        let ciphertext = message.ciphertext_bytes()?;
        let plaintext = decrypt(&self.keys.private, &ciphertext, self.config.padding)?;
        let text = plaintext_to_text(plaintext, self.config.padding)?;
        info!(from = %message.sender, to = %self.name, "message decrypted");
        Ok(text)
    }
}

// Under PKCS#1 v1.5 implicit rejection a wrong key yields random bytes, so
// non-text output there counts as a failed decryption
fn plaintext_to_text(plaintext: Vec<u8>, padding: PaddingScheme) -> Result<String, CryptoError> {
    String::from_utf8(plaintext).map_err(|_| match padding {
        PaddingScheme::Pkcs1v15 => CryptoError::DecryptionFailure,
        PaddingScheme::Oaep => CryptoError::NotUtf8,
    })
}

// One observable step of the exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeEvent {
    Sent(EncryptedMessage),
    Decrypted { recipient: String, text: String },
}

impl fmt::Display for ExchangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeEvent::Sent(message) => write!(
                f,
                "Encrypted message from {} to {}: {}",
                message.sender, message.recipient, message.ciphertext
            ),
            ExchangeEvent::Decrypted { recipient, text } => {
                write!(f, "{} decrypted message: {}", recipient, text)
            }
        }
    }
}

/// Alice greets Bob, then Bob replies to Alice, each through the other's key.
pub fn exchange(alice: &Party, bob: &Party) -> Result<Vec<ExchangeEvent>, CryptoError> {
    let mut events = Vec::with_capacity(4);

    for (sender, recipient) in [(alice, bob), (bob, alice)] {
        let greeting = format!("Hello, {}!", recipient.name());
        let message = sender.send(recipient, &greeting)?;
        events.push(ExchangeEvent::Sent(message.clone()));

        let text = recipient.receive(&message)?;
        events.push(ExchangeEvent::Decrypted {
            recipient: recipient.name().to_string(),
            text,
        });
    }

    Ok(events)
}

pub fn run_exchange(config: &ChannelConfig) -> Result<Vec<ExchangeEvent>, CryptoError> {
    let alice = Party::new("Alice", config)?;
    let bob = Party::new("Bob", config)?;
    exchange(&alice, &bob)
}
