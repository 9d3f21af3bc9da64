//! # hap-crypto
//!
//! Cryptographic primitives for HomeKit pair-setup.
//!
//! This crate provides:
//! - TLV8 encoding for pairing message bodies
//! - SRP-6a (3072-bit, SHA-512) client
//! - HKDF-SHA512 for key derivation
//! - ChaCha20-Poly1305 for AEAD encryption
//! - Ed25519 for long-term identity signatures
//! - Narrow provider traits the pairing state machine is written against
//!
//! All secret material is zeroized on drop.

pub mod chacha;
pub mod ed25519;
pub mod hkdf;
pub mod keys;
pub mod srp;
pub mod tlv;
pub mod traits;

pub use chacha::ChaChaPoly;
pub use ed25519::IdentityKeyPair;
pub use keys::{EncryptionKey, SharedSecret};
pub use srp::{SrpChallenge, SrpClient, SrpParams};
pub use tlv::{Tlv8, TlvType};
pub use traits::{AeadOpen, AeadSeal, Ed25519Verifier, PakeClient, Signer, Verifier};
