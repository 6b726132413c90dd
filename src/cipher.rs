use tracing::{debug, warn};

use crate::config::PaddingScheme;
use crate::error::CryptoError;
use crate::keys::{PrivateKey, PublicKey};

/// Largest plaintext, in bytes, a key of `modulus_bits` can take under `padding`.
pub fn capacity(modulus_bits: u32, padding: PaddingScheme) -> usize {
    (modulus_bits as usize / 8).saturating_sub(padding.overhead())
}

pub fn encrypt(
    public_key: &PublicKey,
    plaintext: &[u8],
    padding: PaddingScheme,
) -> Result<Vec<u8>, CryptoError> {
    let rsa = public_key.rsa()?;

    // RSA can only take one block; refuse instead of truncating
    let max = capacity(public_key.modulus_bits(), padding);
    if plaintext.len() > max {
        return Err(CryptoError::EncodingTooLarge {
            size: plaintext.len(),
            max,
        });
    }

    let mut buf = vec![0; rsa.size() as usize];
    let encrypted_len = rsa.public_encrypt(plaintext, &mut buf, padding.to_openssl())?;
    buf.truncate(encrypted_len);

    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = buf.len(),
        ?padding,
        "encrypted"
    );
    Ok(buf)
}

pub fn decrypt(
    private_key: &PrivateKey,
    ciphertext: &[u8],
    padding: PaddingScheme,
) -> Result<Vec<u8>, CryptoError> {
    let rsa = private_key.rsa()?;

    let expected = rsa.size() as usize;
    if ciphertext.len() != expected {
        return Err(CryptoError::MalformedCiphertext {
            expected,
            actual: ciphertext.len(),
        });
    }

    let mut buf = vec![0; expected];
    // The OpenSSL error stack is dropped here so callers can't tell a padding
    // failure from a key mismatch.
    let decrypted_len = match rsa.private_decrypt(ciphertext, &mut buf, padding.to_openssl()) {
        Ok(len) => len,
        Err(_) => {
            warn!(ciphertext_len = ciphertext.len(), "RSA decryption failed");
            return Err(CryptoError::DecryptionFailure);
        }
    };
    buf.truncate(decrypted_len);

    debug!(plaintext_len = buf.len(), ?padding, "decrypted");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::keys::KeyPair;

    const BOTH: [PaddingScheme; 2] = [PaddingScheme::Oaep, PaddingScheme::Pkcs1v15];

    fn pair(bits: u32) -> KeyPair {
        let config = ChannelConfig {
            min_modulus_bits: 1024,
            ..ChannelConfig::default()
        };
        KeyPair::generate(bits, &config).unwrap()
    }

    #[test]
    fn capacity_for_2048() {
        assert_eq!(capacity(2048, PaddingScheme::Oaep), 214);
        assert_eq!(capacity(2048, PaddingScheme::Pkcs1v15), 245);
        assert_eq!(capacity(4096, PaddingScheme::Oaep), 470);
    }

    #[test]
    fn round_trip_every_supported_size() {
        for bits in [1024, 2048, 3072, 4096] {
            let keys = pair(bits);
            for padding in BOTH {
                let message = vec![0xA5; capacity(bits, padding)];
                let ciphertext = encrypt(&keys.public, &message, padding).unwrap();
                assert_eq!(ciphertext.len(), bits as usize / 8);
                assert_eq!(decrypt(&keys.private, &ciphertext, padding).unwrap(), message);
            }
        }
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let keys = pair(2048);
        let ciphertext = encrypt(&keys.public, b"", PaddingScheme::Oaep).unwrap();
        assert!(decrypt(&keys.private, &ciphertext, PaddingScheme::Oaep)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn size_boundary() {
        let keys = pair(2048);
        for padding in BOTH {
            let max = capacity(2048, padding);
            assert!(encrypt(&keys.public, &vec![1; max], padding).is_ok());

            match encrypt(&keys.public, &vec![1; max + 1], padding) {
                Err(CryptoError::EncodingTooLarge { size, max: limit }) => {
                    assert_eq!(size, max + 1);
                    assert_eq!(limit, max);
                }
                other => panic!("expected EncodingTooLarge, got {:?}", other),
            }
        }
    }

    #[test]
    fn wrong_key_is_rejected() {
        let alice = pair(2048);
        let bob = pair(2048);
        for padding in BOTH {
            let ciphertext = encrypt(&alice.public, b"for alice only", padding).unwrap();
            match decrypt(&bob.private, &ciphertext, padding) {
                // PKCS#1 v1.5 may, very rarely, unpad garbage successfully;
                // it must still never produce the original message.
                Ok(plaintext) if padding == PaddingScheme::Pkcs1v15 => {
                    assert_ne!(plaintext, b"for alice only")
                }
                Err(CryptoError::DecryptionFailure) => {}
                other => panic!("expected DecryptionFailure, got {:?}", other),
            }
        }
    }

    #[test]
    fn corrupted_ciphertext_is_rejected() {
        let keys = pair(2048);
        let mut ciphertext = encrypt(&keys.public, b"hello", PaddingScheme::Oaep).unwrap();
        ciphertext[17] ^= 0x40;
        assert!(matches!(
            decrypt(&keys.private, &ciphertext, PaddingScheme::Oaep),
            Err(CryptoError::DecryptionFailure)
        ));
    }

    #[test]
    fn wrong_length_is_malformed() {
        let keys = pair(2048);
        let ciphertext = encrypt(&keys.public, b"hello", PaddingScheme::Oaep).unwrap();
        match decrypt(&keys.private, &ciphertext[1..], PaddingScheme::Oaep) {
            Err(CryptoError::MalformedCiphertext { expected, actual }) => {
                assert_eq!(expected, 256);
                assert_eq!(actual, 255);
            }
            other => panic!("expected MalformedCiphertext, got {:?}", other),
        }
    }

    #[test]
    fn ciphertext_is_randomized() {
        let keys = pair(2048);
        for padding in BOTH {
            let first = encrypt(&keys.public, b"same message", padding).unwrap();
            let second = encrypt(&keys.public, b"same message", padding).unwrap();
            assert_ne!(first, second);
            assert_eq!(decrypt(&keys.private, &first, padding).unwrap(), b"same message");
            assert_eq!(decrypt(&keys.private, &second, padding).unwrap(), b"same message");
        }
    }
}
