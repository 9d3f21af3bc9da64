//! Long-term key exchange (M5/M6).
//!
//! Both sides sign `context || pairing id || LTPK`, where `context` comes from
//! the key schedule, and seal the identity sub-TLV under the session key.

use hap_core::PairingError;
use hap_crypto::tlv::Tlv8;
use hap_crypto::traits::{AeadOpen, AeadSeal, Signer, Verifier};
use tracing::debug;

use crate::messages::IdentityProof;

/// Nonce label for the controller's M5 payload.
pub const CONTROLLER_NONCE: &[u8] = b"PS-Msg05";

/// Nonce label for the accessory's M6 payload.
pub const ACCESSORY_NONCE: &[u8] = b"PS-Msg06";

/// Accessory identity learned from a verified M6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryIdentity {
    pub pairing_id: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Material signed by either side.
pub fn signing_material(context: &[u8], pairing_id: &[u8], public_key: &[u8]) -> Vec<u8> {
    let mut material = Vec::with_capacity(context.len() + pairing_id.len() + public_key.len());
    material.extend_from_slice(context);
    material.extend_from_slice(pairing_id);
    material.extend_from_slice(public_key);
    material
}

/// Build the sealed M5 payload proving ownership of the controller's LTPK.
pub fn seal_controller_proof<S, A>(
    context: &[u8],
    pairing_id: &[u8],
    signer: &S,
    aead: &A,
) -> Result<Vec<u8>, PairingError>
where
    S: Signer + ?Sized,
    A: AeadSeal + ?Sized,
{
    let public_key = signer.public_key();
    let material = signing_material(context, pairing_id, &public_key);
    let signature = signer.sign(&material);

    let proof = IdentityProof {
        identifier: pairing_id.to_vec(),
        public_key: public_key.to_vec(),
        signature: signature.to_vec(),
    };
    let sealed = aead.seal(CONTROLLER_NONCE, &proof.to_tlv().encode())?;
    debug!(len = sealed.len(), "Sealed controller identity");
    Ok(sealed)
}

/// Open and verify the M6 payload.
///
/// A failed authentication tag is reported as
/// [`PairingError::DecryptionFailed`]; a bad signature or key as
/// [`PairingError::SignatureInvalid`].
pub fn open_accessory_proof<A, V>(
    context: &[u8],
    encrypted: &[u8],
    aead: &A,
    verifier: &V,
) -> Result<AccessoryIdentity, PairingError>
where
    A: AeadOpen + ?Sized,
    V: Verifier + ?Sized,
{
    let plaintext = aead
        .open(ACCESSORY_NONCE, encrypted)
        .map_err(|_| PairingError::DecryptionFailed)?;
    let proof = IdentityProof::parse(&Tlv8::parse(&plaintext)?, 6)?;

    let material = signing_material(context, &proof.identifier, &proof.public_key);
    verifier
        .verify(&proof.public_key, &material, &proof.signature)
        .map_err(|_| PairingError::SignatureInvalid)?;

    Ok(AccessoryIdentity {
        pairing_id: proof.identifier,
        public_key: proof.public_key,
    })
}
