//! # hap-core
//!
//! Core types shared across the HomeKit pair-setup crates.
//!
//! This crate provides:
//! - Error taxonomy for pairing, crypto, parsing and configuration
//! - Pairing characteristic addressing and attribute directory lookup
//! - The HAP request/response envelope used for pairing writes

pub mod address;
pub mod error;
pub mod message;

pub use address::{AttributeDirectory, CharacteristicAddress, Cid};
pub use error::{ConfigError, CryptoError, Error, PairingError, ParseError, Result};
pub use message::{OpCode, PairingRequest, PairingResponse, RequestPayload};
