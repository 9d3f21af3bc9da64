//! # hap-pairing
//!
//! Controller side of HomeKit pair-setup.
//!
//! This crate implements:
//! - The M1-M6 pair-setup state machine (SRP-6a, then Ed25519 long-term key exchange)
//! - TLV8 fragmentation and reassembly of pairing bodies
//! - The HKDF key schedule shared by M5 and M6
//! - An async driver that runs a session over any [`Transport`]
//!
//! The session itself performs no I/O. A successful run yields a
//! [`PairingResult`] holding the long-term keys to persist for pair-verify.

mod config;
mod controller;
mod driver;
pub mod exchange;
pub mod fragment;
pub mod key_schedule;
pub mod messages;
mod pair_setup;
mod result;

#[cfg(test)]
mod mock_accessory;

pub use config::{
    PairSetupConfig, PairSetupConfigBuilder, SetupCode, DEFAULT_RESPONSE_TIMEOUT,
    MAX_FRAGMENT_SIZE,
};
pub use controller::ControllerIdentity;
pub use driver::{drive, pair, Transport};
pub use exchange::AccessoryIdentity;
pub use fragment::{FragmentCodec, Inbound};
pub use key_schedule::{KeySchedule, Purpose};
pub use pair_setup::PairSetup;
pub use result::PairingResult;
