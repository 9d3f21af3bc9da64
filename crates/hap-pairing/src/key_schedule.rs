//! Keys derived from the SRP shared secret after M4.
//!
//! Three 32-byte outputs are expanded from `K` with HKDF-SHA512, each under
//! its own salt and info label: the controller signing context (M5), the
//! session encryption key (M5 and M6) and the accessory signing context (M6).

use hap_core::CryptoError;
use hap_crypto::hkdf::{constants, derive_key_32};
use hap_crypto::keys::{EncryptionKey, SharedSecret};
use zeroize::Zeroizing;

/// Which derived key to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    ControllerSign,
    Encrypt,
    AccessorySign,
}

impl Purpose {
    fn labels(self) -> (&'static [u8], &'static [u8]) {
        match self {
            Self::ControllerSign => (
                constants::PAIR_SETUP_CONTROLLER_SIGN_SALT,
                constants::PAIR_SETUP_CONTROLLER_SIGN_INFO,
            ),
            Self::Encrypt => (
                constants::PAIR_SETUP_ENCRYPT_SALT,
                constants::PAIR_SETUP_ENCRYPT_INFO,
            ),
            Self::AccessorySign => (
                constants::PAIR_SETUP_ACCESSORY_SIGN_SALT,
                constants::PAIR_SETUP_ACCESSORY_SIGN_INFO,
            ),
        }
    }
}

/// Key schedule over one shared secret.
pub struct KeySchedule<'a> {
    shared_secret: &'a SharedSecret,
}

impl<'a> KeySchedule<'a> {
    pub fn new(shared_secret: &'a SharedSecret) -> Self {
        Self { shared_secret }
    }

    /// Derive the 32-byte output for `purpose`.
    pub fn derive(&self, purpose: Purpose) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
        let (salt, info) = purpose.labels();
        derive_key_32(self.shared_secret.as_bytes(), salt, info).map(Zeroizing::new)
    }

    /// Prefix of the material the controller signs in M5.
    pub fn controller_sign_context(&self) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
        self.derive(Purpose::ControllerSign)
    }

    /// ChaCha20-Poly1305 key for the M5 and M6 payloads.
    pub fn encryption_key(&self) -> Result<EncryptionKey, CryptoError> {
        self.derive(Purpose::Encrypt).map(|key| EncryptionKey::new(*key))
    }

    /// Prefix of the material the accessory signs in M6.
    pub fn accessory_sign_context(&self) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
        self.derive(Purpose::AccessorySign)
    }
}
