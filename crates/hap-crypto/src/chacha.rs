//! ChaCha20-Poly1305 AEAD for pairing payloads.

use crate::keys::EncryptionKey;
use hap_core::error::CryptoError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};

/// Poly1305 authentication tag length.
pub const TAG_LEN: usize = 16;

/// Encrypt with explicit 12-byte nonce and no associated data.
///
/// Returns ciphertext with 16-byte auth tag appended.
pub fn encrypt_with_nonce(
    key: &[u8; 32],
    nonce: &[u8; 12],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::Encryption(format!("Invalid key: {}", e)))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("Encryption failed: {}", e)))
}

/// Decrypt with explicit 12-byte nonce and no associated data.
///
/// Expects ciphertext with 16-byte auth tag appended. The tag is verified
/// before any plaintext is released.
pub fn decrypt_with_nonce(
    key: &[u8; 32],
    nonce: &[u8; 12],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::Decryption(
            "Ciphertext too short (missing tag)".to_string(),
        ));
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::Decryption(format!("Invalid key: {}", e)))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption("Decryption/authentication failed".to_string()))
}

/// Create a 12-byte nonce from a label (right-aligned, left-padded with zeros).
///
/// HomeKit nonces like "PS-Msg05" become: `\x00\x00\x00\x00PS-Msg05`
pub fn nonce_from_string(s: &[u8]) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    let len = s.len().min(12);
    let start = 12 - len;
    nonce[start..].copy_from_slice(&s[..len]);
    nonce
}

/// ChaCha20-Poly1305 keyed for one pair-setup session.
pub struct ChaChaPoly {
    key: EncryptionKey,
}

impl ChaChaPoly {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Seal `plaintext` under the nonce built from `label`.
    pub fn seal(&self, label: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        encrypt_with_nonce(self.key.as_bytes(), &nonce_from_string(label), plaintext)
    }

    /// Open `ciphertext || tag` sealed under the nonce built from `label`.
    pub fn open(&self, label: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        decrypt_with_nonce(self.key.as_bytes(), &nonce_from_string(label), ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nonce {
        use super::*;

        #[test]
        fn nonce_from_string_right_aligned() {
            let nonce = nonce_from_string(b"PS-Msg05");
            assert_eq!(&nonce[..4], &[0, 0, 0, 0]);
            assert_eq!(&nonce[4..], b"PS-Msg05");
        }

        #[test]
        fn nonce_from_string_truncates_long_input() {
            let nonce = nonce_from_string(b"0123456789ABCDEF");
            assert_eq!(&nonce, b"0123456789AB");
        }
    }

    mod aead {
        use super::*;

        fn cipher() -> ChaChaPoly {
            ChaChaPoly::new(EncryptionKey::new([0x42; 32]))
        }

        #[test]
        fn seal_appends_tag() {
            let sealed = cipher().seal(b"PS-Msg05", b"hello").unwrap();
            assert_eq!(sealed.len(), 5 + TAG_LEN);
        }

        #[test]
        fn open_reverses_seal() {
            let sealed = cipher().seal(b"PS-Msg06", b"identity tlv").unwrap();
            assert_eq!(cipher().open(b"PS-Msg06", &sealed).unwrap(), b"identity tlv");
        }

        #[test]
        fn open_fails_with_other_label() {
            let sealed = cipher().seal(b"PS-Msg05", b"identity tlv").unwrap();
            assert!(cipher().open(b"PS-Msg06", &sealed).is_err());
        }

        #[test]
        fn open_fails_with_wrong_key() {
            let sealed = cipher().seal(b"PS-Msg05", b"identity tlv").unwrap();
            let other = ChaChaPoly::new(EncryptionKey::new([0x43; 32]));
            assert!(other.open(b"PS-Msg05", &sealed).is_err());
        }

        #[test]
        fn open_fails_on_any_flipped_bit() {
            let sealed = cipher().seal(b"PS-Msg05", b"identity tlv").unwrap();
            for byte in 0..sealed.len() {
                for bit in 0..8 {
                    let mut tampered = sealed.clone();
                    tampered[byte] ^= 1 << bit;
                    assert!(
                        cipher().open(b"PS-Msg05", &tampered).is_err(),
                        "bit {} of byte {} accepted",
                        bit,
                        byte
                    );
                }
            }
        }

        #[test]
        fn open_rejects_input_shorter_than_tag() {
            let result = cipher().open(b"PS-Msg06", &[0u8; 15]);
            assert!(matches!(result, Err(CryptoError::Decryption(_))));
        }

        /// Zero plaintext under zero key and nonce yields the RFC 8439 A.1
        /// test vector #2 keystream (block counter 1).
        #[test]
        fn rfc8439_zero_key_keystream() {
            let sealed = encrypt_with_nonce(&[0u8; 32], &[0u8; 12], &[0u8; 16]).unwrap();
            assert_eq!(
                hex::encode(&sealed[..16]),
                "9f07e7be5551387a98ba977c732d080d"
            );
        }
    }
}
