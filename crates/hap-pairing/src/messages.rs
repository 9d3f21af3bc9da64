//! Typed pair-setup message bodies.
//!
//! Requests (M1, M3, M5) are built from these records and encoded as TLV8;
//! responses (M2, M4, M6) are parsed into them, reporting absent fields as
//! [`PairingError::MalformedResponse`].

use hap_core::PairingError;
use hap_crypto::tlv::{Tlv8, TlvType};

/// Method value requesting pair-setup.
pub const METHOD_PAIR_SETUP: u8 = 0x01;

fn required(tlv: &Tlv8, typ: TlvType, step: u8) -> Result<Vec<u8>, PairingError> {
    tlv.get(typ)
        .map(<[u8]>::to_vec)
        .ok_or(PairingError::MalformedResponse {
            step,
            field: typ.name(),
        })
}

/// Responses that carry a State item must echo the step they answer.
fn check_state(tlv: &Tlv8, step: u8) -> Result<(), PairingError> {
    match tlv.state() {
        Some(state) if state != step => Err(PairingError::MalformedResponse {
            step,
            field: TlvType::State.name(),
        }),
        _ => Ok(()),
    }
}

/// M1: start request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartRequest;

impl StartRequest {
    pub fn to_tlv(&self) -> Tlv8 {
        Tlv8::new()
            .with(TlvType::State, vec![1])
            .with(TlvType::Method, vec![METHOD_PAIR_SETUP])
    }
}

/// M2: accessory salt and SRP public value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrpStartResponse {
    pub salt: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl SrpStartResponse {
    pub fn parse(tlv: &Tlv8) -> Result<Self, PairingError> {
        check_state(tlv, 2)?;
        let salt = required(tlv, TlvType::Salt, 2)?;
        let public_key = required(tlv, TlvType::PublicKey, 2)?;
        if salt.is_empty() {
            return Err(PairingError::MalformedResponse { step: 2, field: "Salt" });
        }
        Ok(Self { salt, public_key })
    }
}

/// M3: controller SRP public value and proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrpVerifyRequest {
    pub public_key: Vec<u8>,
    pub proof: Vec<u8>,
}

impl SrpVerifyRequest {
    pub fn to_tlv(&self) -> Tlv8 {
        Tlv8::new()
            .with(TlvType::State, vec![3])
            .with(TlvType::PublicKey, self.public_key.clone())
            .with(TlvType::Proof, self.proof.clone())
    }
}

/// M4: accessory SRP proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrpVerifyResponse {
    pub proof: Vec<u8>,
}

impl SrpVerifyResponse {
    pub fn parse(tlv: &Tlv8) -> Result<Self, PairingError> {
        check_state(tlv, 4)?;
        Ok(Self {
            proof: required(tlv, TlvType::Proof, 4)?,
        })
    }
}

/// M5: encrypted controller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub encrypted_data: Vec<u8>,
}

impl ExchangeRequest {
    pub fn to_tlv(&self) -> Tlv8 {
        Tlv8::new()
            .with(TlvType::State, vec![5])
            .with(TlvType::EncryptedData, self.encrypted_data.clone())
    }
}

/// M6: encrypted accessory identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    pub encrypted_data: Vec<u8>,
}

impl ExchangeResponse {
    pub fn parse(tlv: &Tlv8) -> Result<Self, PairingError> {
        check_state(tlv, 6)?;
        Ok(Self {
            encrypted_data: required(tlv, TlvType::EncryptedData, 6)?,
        })
    }
}

/// Identity sub-TLV sealed inside M5 and M6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProof {
    pub identifier: Vec<u8>,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl IdentityProof {
    pub fn to_tlv(&self) -> Tlv8 {
        Tlv8::new()
            .with(TlvType::Identifier, self.identifier.clone())
            .with(TlvType::PublicKey, self.public_key.clone())
            .with(TlvType::Signature, self.signature.clone())
    }

    /// Parse the sub-TLV decrypted from the response to `step`.
    pub fn parse(tlv: &Tlv8, step: u8) -> Result<Self, PairingError> {
        Ok(Self {
            identifier: required(tlv, TlvType::Identifier, step)?,
            public_key: required(tlv, TlvType::PublicKey, step)?,
            signature: required(tlv, TlvType::Signature, step)?,
        })
    }
}
