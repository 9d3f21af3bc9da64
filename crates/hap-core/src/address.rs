//! Characteristic addressing for pairing requests.
//!
//! Every pairing message is a write to one characteristic of the accessory's
//! pairing service. The accessory's attribute database maps that address to a
//! numeric instance id (`cid`) which the transport uses on the wire.

use std::collections::HashMap;
use std::fmt;

/// HAP pairing service UUID (short form 0x55).
pub const PAIRING_SERVICE_UUID: &str = "000000550000100080000026bb765291";

/// HAP pair-setup characteristic UUID (short form 0x4C).
pub const PAIR_SETUP_CHARACTERISTIC_UUID: &str = "0000004c0000100080000026bb765291";

/// Characteristic instance id assigned by the accessory.
pub type Cid = u16;

/// Service + characteristic pair identifying a pairing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacteristicAddress {
    pub service: String,
    pub characteristic: String,
}

impl CharacteristicAddress {
    /// Create an address from service and characteristic UUIDs.
    pub fn new(service: impl Into<String>, characteristic: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            characteristic: characteristic.into(),
        }
    }

    /// Address of the pair-setup characteristic on the pairing service.
    pub fn pair_setup() -> Self {
        Self::new(PAIRING_SERVICE_UUID, PAIR_SETUP_CHARACTERISTIC_UUID)
    }
}

impl Default for CharacteristicAddress {
    fn default() -> Self {
        Self::pair_setup()
    }
}

impl fmt::Display for CharacteristicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.characteristic)
    }
}

/// Lookup of characteristic instance ids from an accessory's attribute database.
pub trait AttributeDirectory {
    /// Resolve an address to its instance id, if the accessory exposes it.
    fn characteristic_id(&self, address: &CharacteristicAddress) -> Option<Cid>;
}

impl AttributeDirectory for HashMap<CharacteristicAddress, Cid> {
    fn characteristic_id(&self, address: &CharacteristicAddress) -> Option<Cid> {
        self.get(address).copied()
    }
}
