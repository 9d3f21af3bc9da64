//! TLV8 encoding/decoding for HomeKit pairing messages.
//!
//! TLV8 format: [Type: 1 byte][Length: 1 byte][Value: 0-255 bytes]
//! Values longer than 255 bytes are fragmented across multiple TLVs.

use hap_core::error::ParseError;

/// TLV type constants for HomeKit pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TlvType {
    Method = 0x00,
    Identifier = 0x01,
    Salt = 0x02,
    PublicKey = 0x03,
    Proof = 0x04,
    EncryptedData = 0x05,
    State = 0x06,
    Error = 0x07,
    RetryDelay = 0x08,
    Signature = 0x0A,
    FragmentData = 0x0C,
    FragmentLast = 0x0D,
}

impl TlvType {
    /// Convert from raw byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Self::Method),
            0x01 => Some(Self::Identifier),
            0x02 => Some(Self::Salt),
            0x03 => Some(Self::PublicKey),
            0x04 => Some(Self::Proof),
            0x05 => Some(Self::EncryptedData),
            0x06 => Some(Self::State),
            0x07 => Some(Self::Error),
            0x08 => Some(Self::RetryDelay),
            0x0A => Some(Self::Signature),
            0x0C => Some(Self::FragmentData),
            0x0D => Some(Self::FragmentLast),
            _ => None,
        }
    }

    /// Field name used in error reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Method => "Method",
            Self::Identifier => "Identifier",
            Self::Salt => "Salt",
            Self::PublicKey => "PublicKey",
            Self::Proof => "Proof",
            Self::EncryptedData => "EncryptedData",
            Self::State => "State",
            Self::Error => "Error",
            Self::RetryDelay => "RetryDelay",
            Self::Signature => "Signature",
            Self::FragmentData => "FragmentData",
            Self::FragmentLast => "FragmentLast",
        }
    }
}

/// Parsed TLV8 message.
///
/// Items keep insertion order so encoded messages lead with the fields they
/// were built with (State first for pairing requests). Unknown types are
/// skipped while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tlv8 {
    items: Vec<(TlvType, Vec<u8>)>,
}

impl Tlv8 {
    /// Create empty TLV8 message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TLV8 from bytes.
    ///
    /// Consecutive TLVs with the same type are concatenated.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let mut tlv = Self::new();
        let mut i = 0;
        let mut last_type: Option<u8> = None;

        while i < data.len() {
            if i + 2 > data.len() {
                return Err(ParseError::InvalidFormat(
                    "TLV8: truncated header".to_string(),
                ));
            }

            let raw = data[i];
            let len = data[i + 1] as usize;
            i += 2;

            if i + len > data.len() {
                return Err(ParseError::InvalidFormat(format!(
                    "TLV8: truncated value (expected {} bytes, got {})",
                    len,
                    data.len() - i
                )));
            }

            let value = &data[i..i + len];
            i += len;

            if let Some(typ) = TlvType::from_byte(raw) {
                match tlv.items.iter_mut().find(|(t, _)| *t == typ) {
                    Some((_, existing)) if last_type == Some(raw) => {
                        existing.extend_from_slice(value)
                    }
                    Some((_, existing)) => *existing = value.to_vec(),
                    None => tlv.items.push((typ, value.to_vec())),
                }
            }

            last_type = Some(raw);
        }

        Ok(tlv)
    }

    /// Encode to bytes.
    ///
    /// Values > 255 bytes are automatically fragmented across multiple TLVs.
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::new();

        for (typ, value) in &self.items {
            if value.is_empty() {
                result.push(*typ as u8);
                result.push(0);
            } else {
                for chunk in value.chunks(255) {
                    result.push(*typ as u8);
                    result.push(chunk.len() as u8);
                    result.extend_from_slice(chunk);
                }
            }
        }

        result
    }

    /// Get value for type.
    pub fn get(&self, typ: TlvType) -> Option<&[u8]> {
        self.items
            .iter()
            .find(|(t, _)| *t == typ)
            .map(|(_, v)| v.as_slice())
    }

    /// Get value for type or report it missing.
    pub fn require(&self, typ: TlvType) -> Result<&[u8], ParseError> {
        self.get(typ).ok_or(ParseError::MissingField(typ.name()))
    }

    /// Set value for type, replacing any previous value.
    pub fn set(&mut self, typ: TlvType, value: impl Into<Vec<u8>>) {
        let value = value.into();
        match self.items.iter_mut().find(|(t, _)| *t == typ) {
            Some((_, existing)) => *existing = value,
            None => self.items.push((typ, value)),
        }
    }

    /// Builder-style [`Tlv8::set`].
    pub fn with(mut self, typ: TlvType, value: impl Into<Vec<u8>>) -> Self {
        self.set(typ, value);
        self
    }

    /// Remove and return the value for type.
    pub fn take(&mut self, typ: TlvType) -> Option<Vec<u8>> {
        let idx = self.items.iter().position(|(t, _)| *t == typ)?;
        Some(self.items.remove(idx).1)
    }

    /// Check if type is present.
    pub fn contains(&self, typ: TlvType) -> bool {
        self.get(typ).is_some()
    }

    /// Get state value (single byte).
    pub fn state(&self) -> Option<u8> {
        self.get(TlvType::State).and_then(|v| v.first().copied())
    }

    /// Get error value (single byte).
    pub fn error(&self) -> Option<u8> {
        self.get(TlvType::Error).and_then(|v| v.first().copied())
    }

    /// Get retry delay value in seconds (for rate limiting).
    /// The value is little-endian encoded (1-2 bytes).
    pub fn retry_delay(&self) -> Option<u16> {
        self.get(TlvType::RetryDelay).map(|v| match v.len() {
            0 => 0,
            1 => v[0] as u16,
            _ => u16::from_le_bytes([v[0], v[1]]),
        })
    }
}
