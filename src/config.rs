use openssl::rsa::Padding;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// RSA modulus lengths the channel will generate or accept.
pub const SUPPORTED_MODULUS_BITS: [u32; 4] = [1024, 2048, 3072, 4096];

// Anything below this gets a warning even when policy allows it
pub const WEAK_MODULUS_BITS: u32 = 2048;

// Padding applied before the RSA operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingScheme {
    /// RSAES-OAEP with SHA-1 and MGF1, OpenSSL's default OAEP parameters.
    Oaep,
    /// RSAES-PKCS1-v1_5.
    ///
    /// OpenSSL 3.2 and later use implicit rejection here: decrypting with the
    /// wrong key can return random bytes instead of an error. `cipher::decrypt`
    /// passes those through; `Party::receive` turns non-text results into
    /// `DecryptionFailure`. Prefer `Oaep` wherever the error matters.
    Pkcs1v15,
}

impl PaddingScheme {
    /// Bytes of each RSA block consumed by the padding.
    pub fn overhead(self) -> usize {
        match self {
            // 2 * SHA-1 digest length + 2
            PaddingScheme::Oaep => 42,
            PaddingScheme::Pkcs1v15 => 11,
        }
    }

    pub(crate) fn to_openssl(self) -> Padding {
        match self {
            PaddingScheme::Oaep => Padding::PKCS1_OAEP,
            PaddingScheme::Pkcs1v15 => Padding::PKCS1,
        }
    }
}

// Container format used when keys are exported or imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    /// PEM text wrapping PKCS#1 (`BEGIN RSA PRIVATE KEY` / `BEGIN RSA PUBLIC KEY`).
    Pkcs1Pem,
    /// Raw PKCS#1 DER bytes.
    Pkcs1Der,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub modulus_bits: u32,
    pub min_modulus_bits: u32,
    pub padding: PaddingScheme,
    pub key_encoding: KeyEncoding,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            modulus_bits: 2048,
            min_modulus_bits: 2048,
            padding: PaddingScheme::Oaep,
            key_encoding: KeyEncoding::Pkcs1Pem,
        }
    }
}

impl ChannelConfig {
    // Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        let config: ChannelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CryptoError> {
        self.check_modulus(self.modulus_bits)
    }

    /// Applies the key-size policy to `bits`.
    pub fn check_modulus(&self, bits: u32) -> Result<(), CryptoError> {
        if !SUPPORTED_MODULUS_BITS.contains(&bits) {
            return Err(CryptoError::KeyPolicy(format!(
                "unsupported modulus length {} (supported: {:?})",
                bits, SUPPORTED_MODULUS_BITS
            )));
        }
        if bits < self.min_modulus_bits {
            return Err(CryptoError::KeyPolicy(format!(
                "modulus length {} is below the policy minimum of {}",
                bits, self.min_modulus_bits
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ChannelConfig::from_json("{}").unwrap();
        assert_eq!(config, ChannelConfig::default());
        assert_eq!(config.modulus_bits, 2048);
        assert_eq!(config.padding, PaddingScheme::Oaep);
    }

    #[test]
    fn parses_snake_case_enums() {
        let config = ChannelConfig::from_json(
            r#"{"modulus_bits": 3072, "padding": "pkcs1v15", "key_encoding": "pkcs1_der"}"#,
        )
        .unwrap();
        assert_eq!(config.modulus_bits, 3072);
        assert_eq!(config.padding, PaddingScheme::Pkcs1v15);
        assert_eq!(config.key_encoding, KeyEncoding::Pkcs1Der);
    }

    #[test]
    fn rejects_unsupported_modulus() {
        let err = ChannelConfig::from_json(r#"{"modulus_bits": 1536}"#).unwrap_err();
        assert!(matches!(err, CryptoError::KeyPolicy(_)));
    }

    #[test]
    fn weak_modulus_needs_lowered_floor() {
        let err = ChannelConfig::from_json(r#"{"modulus_bits": 1024}"#).unwrap_err();
        assert!(matches!(err, CryptoError::KeyPolicy(_)));

        let config =
            ChannelConfig::from_json(r#"{"modulus_bits": 1024, "min_modulus_bits": 1024}"#)
                .unwrap();
        assert_eq!(config.modulus_bits, 1024);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ChannelConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, CryptoError::Config(_)));
    }

    #[test]
    fn overhead_matches_padding() {
        assert_eq!(PaddingScheme::Oaep.overhead(), 42);
        assert_eq!(PaddingScheme::Pkcs1v15.overhead(), 11);
    }
}
