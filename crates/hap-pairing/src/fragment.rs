//! TLV8 body fragmentation.
//!
//! Accessories with small write buffers may split a response body across
//! several round trips. Each non-final chunk arrives as a `FragmentData`
//! item and must be acknowledged with an empty `FragmentData` item; the final
//! chunk arrives as `FragmentLast`. The concatenated chunks are the real body.
//!
//! The same framing is used in the other direction when the controller is
//! configured with a maximum fragment size.

use hap_core::ParseError;
use hap_crypto::tlv::{Tlv8, TlvType};

/// Result of feeding one inbound body to the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A continuation chunk was buffered; acknowledge it and wait.
    MoreDataNeeded,
    /// A complete pairing body.
    Complete(Tlv8),
}

/// Reassembly buffer for one pairing session.
#[derive(Debug, Default)]
pub struct FragmentCodec {
    reassembly: Vec<u8>,
}

impl FragmentCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify an inbound body.
    ///
    /// An `Error` item at the top level completes the body immediately and
    /// discards any buffered chunks. The buffer is drained whenever a body
    /// completes, including when the reassembled bytes fail to parse.
    pub fn decode_inbound(&mut self, raw: &[u8]) -> Result<Inbound, ParseError> {
        let mut outer = match Tlv8::parse(raw) {
            Ok(tlv) => tlv,
            Err(e) => {
                self.reassembly.clear();
                return Err(e);
            }
        };

        if outer.contains(TlvType::Error) {
            self.reassembly.clear();
            return Ok(Inbound::Complete(outer));
        }

        if let Some(chunk) = outer.take(TlvType::FragmentData) {
            self.reassembly.extend_from_slice(&chunk);
            return Ok(Inbound::MoreDataNeeded);
        }

        if let Some(last) = outer.take(TlvType::FragmentLast) {
            let mut body = std::mem::take(&mut self.reassembly);
            body.extend_from_slice(&last);
            return Tlv8::parse(&body).map(Inbound::Complete);
        }

        self.reassembly.clear();
        Ok(Inbound::Complete(outer))
    }

    /// Bytes buffered from continuation chunks so far.
    pub fn buffered_len(&self) -> usize {
        self.reassembly.len()
    }

    pub fn is_reassembling(&self) -> bool {
        !self.reassembly.is_empty()
    }

    /// Body acknowledging a continuation chunk.
    pub fn acknowledgement() -> Vec<u8> {
        Tlv8::new().with(TlvType::FragmentData, Vec::new()).encode()
    }

    /// Whether `raw` is a bare acknowledgement.
    pub fn is_acknowledgement(raw: &[u8]) -> bool {
        matches!(Tlv8::parse(raw), Ok(tlv) if tlv.get(TlvType::FragmentData) == Some(&[][..]))
    }

    /// Split an encoded body into wire bodies of at most `max_size` payload bytes.
    ///
    /// Bodies that fit are returned unchanged as the only element.
    pub fn split_outbound(body: &[u8], max_size: usize) -> Vec<Vec<u8>> {
        if max_size == 0 || body.len() <= max_size {
            return vec![body.to_vec()];
        }

        let chunks: Vec<&[u8]> = body.chunks(max_size).collect();
        let last = chunks.len() - 1;
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let typ = if i == last {
                    TlvType::FragmentLast
                } else {
                    TlvType::FragmentData
                };
                Tlv8::new().with(typ, chunk.to_vec()).encode()
            })
            .collect()
    }
}
