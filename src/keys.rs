use base64::{Engine as _, engine::general_purpose::STANDARD};
use openssl::bn::BigNum;
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::Rsa;
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{ChannelConfig, KeyEncoding, WEAK_MODULUS_BITS};
use crate::error::CryptoError;

const PUBLIC_EXPONENT: u32 = 65537;

#[derive(Clone)]
pub struct PublicKey {
    key: PKey<Public>,
}

#[derive(Clone)]
pub struct PrivateKey {
    key: PKey<Private>,
}

/// A party's RSA key pair. Never mutated after generation.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    pub fn generate(modulus_bits: u32, config: &ChannelConfig) -> Result<Self, CryptoError> {
        apply_key_policy(modulus_bits, config, "generating")?;

        let start = Instant::now();
        let exponent = BigNum::from_u32(PUBLIC_EXPONENT)
            .map_err(|e| CryptoError::GenerationFailure(e.to_string()))?;
        let rsa = Rsa::generate_with_e(modulus_bits, &exponent)
            .map_err(|e| CryptoError::GenerationFailure(e.to_string()))?;

        let private = PrivateKey::from_rsa(rsa)
            .map_err(|e| CryptoError::GenerationFailure(e.to_string()))?;
        let public = private
            .public_key()
            .map_err(|e| CryptoError::GenerationFailure(e.to_string()))?;

        info!(bits = modulus_bits, elapsed = ?start.elapsed(), "generated RSA key pair");

        Ok(Self { public, private })
    }

    // Run generation on tokio's blocking pool; large moduli can take a while
    pub async fn generate_blocking_task(
        modulus_bits: u32,
        config: ChannelConfig,
    ) -> Result<Self, CryptoError> {
        tokio::task::spawn_blocking(move || Self::generate(modulus_bits, &config)).await?
    }

    pub fn modulus_bits(&self) -> u32 {
        self.public.modulus_bits()
    }
}

impl PublicKey {
    pub fn modulus_bits(&self) -> u32 {
        self.key.bits()
    }

    /// Ciphertext size in bytes for this key.
    pub fn size(&self) -> usize {
        self.key.size()
    }

    pub(crate) fn rsa(&self) -> Result<Rsa<Public>, CryptoError> {
        Ok(self.key.rsa()?)
    }

    pub fn to_encoded(&self, encoding: KeyEncoding) -> Result<Vec<u8>, CryptoError> {
        let rsa = self.rsa()?;
        let encoded = match encoding {
            KeyEncoding::Pkcs1Pem => rsa.public_key_to_pem_pkcs1()?,
            KeyEncoding::Pkcs1Der => rsa.public_key_to_der_pkcs1()?,
        };
        Ok(encoded)
    }

    // PEM as text, for printing or embedding
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        let pem = self.to_encoded(KeyEncoding::Pkcs1Pem)?;
        String::from_utf8(pem).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    // DER has no text form of its own, so it goes out as base64
    pub fn to_text(&self, encoding: KeyEncoding) -> Result<String, CryptoError> {
        match encoding {
            KeyEncoding::Pkcs1Pem => self.to_pem(),
            KeyEncoding::Pkcs1Der => Ok(STANDARD.encode(self.to_encoded(encoding)?)),
        }
    }

    /// Parses a key in `config.key_encoding` and holds it to the same
    /// key-size policy as generation.
    pub fn from_encoded(data: &[u8], config: &ChannelConfig) -> Result<Self, CryptoError> {
        let rsa = match config.key_encoding {
            KeyEncoding::Pkcs1Pem => Rsa::public_key_from_pem_pkcs1(data),
            KeyEncoding::Pkcs1Der => Rsa::public_key_from_der_pkcs1(data),
        }
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        apply_key_policy(rsa.n().num_bits() as u32, config, "importing")?;
        let key = PKey::from_rsa(rsa)?;
        Ok(Self { key })
    }
}

impl PrivateKey {
    fn from_rsa(rsa: Rsa<Private>) -> Result<Self, openssl::error::ErrorStack> {
        Ok(Self {
            key: PKey::from_rsa(rsa)?,
        })
    }

    pub fn modulus_bits(&self) -> u32 {
        self.key.bits()
    }

    pub fn size(&self) -> usize {
        self.key.size()
    }

    pub(crate) fn rsa(&self) -> Result<Rsa<Private>, CryptoError> {
        Ok(self.key.rsa()?)
    }

    // Extract the public key from the private key
    pub fn public_key(&self) -> Result<PublicKey, openssl::error::ErrorStack> {
        let rsa = self.key.rsa()?;
        let n = rsa.n().to_owned()?;
        let e = rsa.e().to_owned()?;
        let public = Rsa::from_public_components(n, e)?;
        Ok(PublicKey {
            key: PKey::from_rsa(public)?,
        })
    }

    pub fn to_encoded(&self, encoding: KeyEncoding) -> Result<Vec<u8>, CryptoError> {
        let rsa = self.rsa()?;
        let encoded = match encoding {
            KeyEncoding::Pkcs1Pem => rsa.private_key_to_pem()?,
            KeyEncoding::Pkcs1Der => rsa.private_key_to_der()?,
        };
        Ok(encoded)
    }

    pub fn from_encoded(data: &[u8], config: &ChannelConfig) -> Result<Self, CryptoError> {
        let rsa = match config.key_encoding {
            KeyEncoding::Pkcs1Pem => Rsa::private_key_from_pem(data),
            KeyEncoding::Pkcs1Der => Rsa::private_key_from_der(data),
        }
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        if !rsa.check_key().map_err(|e| CryptoError::InvalidKey(e.to_string()))? {
            return Err(CryptoError::InvalidKey("RSA key failed consistency check".into()));
        }
        apply_key_policy(rsa.n().num_bits() as u32, config, "importing")?;
        Ok(Self::from_rsa(rsa)?)
    }
}

// Policy check shared by generated and imported keys; weak keys that the
// policy lets through are still flagged
fn apply_key_policy(bits: u32, config: &ChannelConfig, action: &str) -> Result<(), CryptoError> {
    config.check_modulus(bits)?;
    if bits < WEAK_MODULUS_BITS {
        warn!(bits, action, "weak RSA key");
    }
    Ok(())
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.modulus_bits())
            .finish()
    }
}

// Never print private key material
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}
