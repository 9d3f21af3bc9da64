//! Narrow provider interfaces for the pairing primitives.
//!
//! The pair-setup state machine only talks to these traits; the concrete
//! SRP-6a, Ed25519 and ChaCha20-Poly1305 implementations in this crate are
//! the default providers.

use crate::chacha::ChaChaPoly;
use crate::ed25519::{self, IdentityKeyPair};
use crate::keys::SharedSecret;
use crate::srp::SrpClient;
use hap_core::error::CryptoError;

/// Client half of a password-authenticated key exchange.
pub trait PakeClient: Send {
    /// Client public value to send to the accessory.
    fn public_key(&self) -> Vec<u8>;

    /// Client proof to send to the accessory.
    fn client_proof(&self) -> &[u8];

    /// Check the accessory's proof.
    fn verify_server_proof(&self, proof: &[u8]) -> Result<(), CryptoError>;

    /// Secret both sides agreed on.
    fn shared_secret(&self) -> &SharedSecret;
}

/// Produces signatures with a long-term key.
pub trait Signer {
    /// Public half of the signing key.
    fn public_key(&self) -> [u8; 32];

    fn sign(&self, message: &[u8]) -> [u8; 64];
}

/// Checks signatures against a claimed public key.
pub trait Verifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8])
        -> Result<(), CryptoError>;
}

/// Authenticated encryption under a per-direction nonce label.
pub trait AeadSeal {
    /// Returns ciphertext with the authentication tag appended.
    fn seal(&self, label: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Authenticated decryption under a per-direction nonce label.
pub trait AeadOpen {
    /// Verifies the trailing tag before releasing plaintext.
    fn open(&self, label: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

impl PakeClient for SrpClient {
    fn public_key(&self) -> Vec<u8> {
        SrpClient::public_key(self)
    }

    fn client_proof(&self) -> &[u8] {
        SrpClient::client_proof(self)
    }

    fn verify_server_proof(&self, proof: &[u8]) -> Result<(), CryptoError> {
        SrpClient::verify_server_proof(self, proof)
    }

    fn shared_secret(&self) -> &SharedSecret {
        SrpClient::shared_secret(self)
    }
}

impl Signer for IdentityKeyPair {
    fn public_key(&self) -> [u8; 32] {
        IdentityKeyPair::public_key(self)
    }

    fn sign(&self, message: &[u8]) -> [u8; 64] {
        IdentityKeyPair::sign(self, message)
    }
}

/// Ed25519 signature verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Verifier for Ed25519Verifier {
    fn verify(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        ed25519::verify(public_key, message, signature)
    }
}

impl AeadSeal for ChaChaPoly {
    fn seal(&self, label: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        ChaChaPoly::seal(self, label, plaintext)
    }
}

impl AeadOpen for ChaChaPoly {
    fn open(&self, label: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        ChaChaPoly::open(self, label, ciphertext)
    }
}
