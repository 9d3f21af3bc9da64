//! Controller identity presented to the accessory in M5.
//!
//! A fresh identity is generated for every pair-setup run: a random UUID
//! pairing identifier plus a new Ed25519 long-term key pair. The caller
//! persists both from the [`PairingResult`](crate::PairingResult) to run
//! pair-verify later.

use hap_crypto::ed25519::IdentityKeyPair;
use hap_crypto::traits::Signer;
use uuid::Uuid;

/// Controller pairing identifier and long-term key pair.
#[derive(Clone)]
pub struct ControllerIdentity {
    /// Lowercase hyphenated UUID, sent as the Identifier TLV.
    id: String,
    keypair: IdentityKeyPair,
}

impl ControllerIdentity {
    /// Generate a random identifier and key pair.
    pub fn generate() -> Self {
        Self::with_id(IdentityKeyPair::generate(), Uuid::new_v4().to_string())
    }

    /// Use an existing key pair with a caller-chosen identifier.
    pub fn with_id(keypair: IdentityKeyPair, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keypair,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier bytes for TLV encoding.
    pub fn id_bytes(&self) -> &[u8] {
        self.id.as_bytes()
    }

    pub fn keypair(&self) -> &IdentityKeyPair {
        &self.keypair
    }

    /// Long-term public key (LTPK).
    pub fn public_key(&self) -> [u8; 32] {
        self.keypair.public_key()
    }
}

impl Signer for ControllerIdentity {
    fn public_key(&self) -> [u8; 32] {
        self.keypair.public_key()
    }

    fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.keypair.sign(message)
    }
}

impl std::fmt::Debug for ControllerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerIdentity")
            .field("id", &self.id)
            .field("keypair", &self.keypair)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hap_crypto::ed25519;

    #[test]
    fn generate_creates_uuid_identifier() {
        let identity = ControllerIdentity::generate();

        // 8-4-4-4-12
        assert_eq!(identity.id().len(), 36);
        assert!(Uuid::parse_str(identity.id()).is_ok());
        assert_eq!(identity.id_bytes(), identity.id().as_bytes());
    }

    #[test]
    fn generate_is_fresh_each_time() {
        let a = ControllerIdentity::generate();
        let b = ControllerIdentity::generate();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn with_id_uses_custom_identifier() {
        let keypair = IdentityKeyPair::from_seed(&[3u8; 32]);
        let pk = keypair.public_key();
        let identity = ControllerIdentity::with_id(keypair, "controller-1");

        assert_eq!(identity.id(), "controller-1");
        assert_eq!(identity.public_key(), pk);
    }

    #[test]
    fn signs_with_long_term_key() {
        let identity = ControllerIdentity::generate();
        let signature = Signer::sign(&identity, b"material");
        assert!(ed25519::verify(&identity.public_key(), b"material", &signature).is_ok());
    }
}
