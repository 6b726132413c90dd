// This file allows the components to be used as a library as well
pub mod channel;
pub mod cipher;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;

// Re-export important types for easier use
pub use channel::{ExchangeEvent, Party, exchange, run_exchange};
pub use cipher::{capacity, decrypt, encrypt};
pub use config::{ChannelConfig, KeyEncoding, PaddingScheme};
pub use error::CryptoError;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use models::EncryptedMessage;
