//! HAP request/response envelope for pairing writes.
//!
//! Pairing commands are encapsulated in characteristic writes: the pairing
//! TLV8 body travels in `HAP-Param-Value` and the write carries
//! `HAP-Param-Return-Response = 1` so the accessory answers with a body.

use crate::address::{CharacteristicAddress, Cid};
use crate::error::ParseError;

/// HAP parameter type for the characteristic value.
pub const HAP_PARAM_VALUE: u8 = 0x01;

/// HAP parameter type requesting a write response.
pub const HAP_PARAM_RETURN_RESPONSE: u8 = 0x09;

/// HAP characteristic operation codes used by pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    CharacteristicSignatureRead = 0x01,
    CharacteristicWrite = 0x02,
    CharacteristicRead = 0x03,
}

/// Parameters of a characteristic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    /// Encoded pairing TLV8 body.
    pub value: Vec<u8>,
    /// Ask the accessory to return a response body.
    pub return_response: bool,
}

impl RequestPayload {
    /// Payload carrying `value` that asks for a response.
    pub fn with_response(value: Vec<u8>) -> Self {
        Self {
            value,
            return_response: true,
        }
    }

    /// Encode as HAP parameter TLV.
    ///
    /// The value is split into 255-byte items of the same type, which the
    /// accessory concatenates.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.value.len() + self.value.len() / 255 * 2 + 5);
        if self.value.is_empty() {
            out.push(HAP_PARAM_VALUE);
            out.push(0);
        } else {
            for chunk in self.value.chunks(255) {
                out.push(HAP_PARAM_VALUE);
                out.push(chunk.len() as u8);
                out.extend_from_slice(chunk);
            }
        }
        if self.return_response {
            out.extend_from_slice(&[HAP_PARAM_RETURN_RESPONSE, 0x01, 0x01]);
        }
        out
    }
}

/// Outbound pairing message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingRequest {
    pub address: CharacteristicAddress,
    pub cid: Cid,
    pub opcode: OpCode,
    pub payload: RequestPayload,
    /// Sent before any session security exists.
    pub insecure: bool,
}

impl PairingRequest {
    /// Insecure characteristic write of `value` with a response requested.
    pub fn write(address: CharacteristicAddress, cid: Cid, value: Vec<u8>) -> Self {
        Self {
            address,
            cid,
            opcode: OpCode::CharacteristicWrite,
            payload: RequestPayload::with_response(value),
            insecure: true,
        }
    }

    /// Pairing TLV8 body of this request.
    pub fn body(&self) -> &[u8] {
        &self.payload.value
    }
}

/// Inbound pairing response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingResponse {
    /// Pairing TLV8 body returned in `HAP-Param-Value`.
    pub value: Vec<u8>,
}

impl PairingResponse {
    /// Wrap an already extracted response body.
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Extract the `HAP-Param-Value` item from a HAP parameter TLV.
    ///
    /// Consecutive value items are concatenated; other parameters are ignored.
    pub fn parse(params: &[u8]) -> Result<Self, ParseError> {
        let mut value: Option<Vec<u8>> = None;
        let mut i = 0;
        while i < params.len() {
            if i + 2 > params.len() {
                return Err(ParseError::InvalidFormat(
                    "HAP params: truncated header".to_string(),
                ));
            }
            let typ = params[i];
            let len = params[i + 1] as usize;
            i += 2;
            if i + len > params.len() {
                return Err(ParseError::InvalidFormat(format!(
                    "HAP params: truncated value (expected {} bytes, got {})",
                    len,
                    params.len() - i
                )));
            }
            if typ == HAP_PARAM_VALUE {
                value
                    .get_or_insert_with(Vec::new)
                    .extend_from_slice(&params[i..i + len]);
            }
            i += len;
        }

        value
            .map(Self::new)
            .ok_or(ParseError::MissingField("HAP-Param-Value"))
    }
}
