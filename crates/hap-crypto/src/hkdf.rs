//! HKDF-SHA512 expansion used by the pair-setup key schedule.

use hap_core::error::CryptoError;

use hkdf::Hkdf;
use sha2::Sha512;

/// Fill `okm` with HKDF-SHA512 output for the given salt and info label.
///
/// Fails only when `okm` exceeds 255 hash blocks.
pub fn expand_into(ikm: &[u8], salt: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), CryptoError> {
    let len = okm.len();
    Hkdf::<Sha512>::new(Some(salt), ikm)
        .expand(info, okm)
        .map_err(|_| CryptoError::KeyDerivation(format!("cannot expand {} bytes", len)))
}

/// Derive a 32-byte key, the size of every pair-setup derivation.
pub fn derive_key_32(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut okm = [0u8; 32];
    expand_into(ikm, salt, info, &mut okm)?;
    Ok(okm)
}

/// Salt and info labels for pair-setup derivations.
pub mod constants {
    pub const PAIR_SETUP_CONTROLLER_SIGN_SALT: &[u8] = b"Pair-Setup-Controller-Sign-Salt";
    pub const PAIR_SETUP_CONTROLLER_SIGN_INFO: &[u8] = b"Pair-Setup-Controller-Sign-Info";

    pub const PAIR_SETUP_ENCRYPT_SALT: &[u8] = b"Pair-Setup-Encrypt-Salt";
    pub const PAIR_SETUP_ENCRYPT_INFO: &[u8] = b"Pair-Setup-Encrypt-Info";

    pub const PAIR_SETUP_ACCESSORY_SIGN_SALT: &[u8] = b"Pair-Setup-Accessory-Sign-Salt";
    pub const PAIR_SETUP_ACCESSORY_SIGN_INFO: &[u8] = b"Pair-Setup-Accessory-Sign-Info";
}
