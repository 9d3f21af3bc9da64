//! Outcome of a completed pair-setup.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::controller::ControllerIdentity;
use crate::exchange::AccessoryIdentity;

/// Long-term pairing data to persist for later pair-verify sessions.
///
/// Keys are lowercase hex. `controller_ltsk` is the 32-byte Ed25519 seed and
/// is wiped when the value is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PairingResult {
    pub controller_pairing_id: String,
    pub controller_ltsk: String,
    pub controller_ltpk: String,
    pub accessory_pairing_id: String,
    pub accessory_ltpk: String,
}

impl PairingResult {
    pub(crate) fn new(controller: &ControllerIdentity, accessory: &AccessoryIdentity) -> Self {
        Self {
            controller_pairing_id: controller.id().to_string(),
            controller_ltsk: hex::encode(controller.keypair().seed()),
            controller_ltpk: hex::encode(controller.public_key()),
            accessory_pairing_id: String::from_utf8_lossy(&accessory.pairing_id).into_owned(),
            accessory_ltpk: hex::encode(&accessory.public_key),
        }
    }
}

impl std::fmt::Debug for PairingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingResult")
            .field("controller_pairing_id", &self.controller_pairing_id)
            .field("controller_ltpk", &self.controller_ltpk)
            .field("accessory_pairing_id", &self.accessory_pairing_id)
            .field("accessory_ltpk", &self.accessory_ltpk)
            .finish_non_exhaustive()
    }
}
