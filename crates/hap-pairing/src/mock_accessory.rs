//! In-process accessory for exercising the controller against real SRP,
//! HKDF, ChaCha20-Poly1305 and Ed25519 math.

use std::collections::VecDeque;

use hap_core::{PairingRequest, PairingResponse};
use hap_crypto::chacha::{decrypt_with_nonce, encrypt_with_nonce, nonce_from_string};
use hap_crypto::ed25519::{self, IdentityKeyPair};
use hap_crypto::srp::{pad_to_n, SrpParams, PAIR_SETUP_IDENTITY};
use hap_crypto::tlv::{Tlv8, TlvType};
use hkdf::Hkdf;
use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};

use crate::fragment::FragmentCodec;

pub(crate) const ACCESSORY_PAIRING_ID: &[u8] = b"AA:BB:CC:DD:EE:FF";

/// Misbehavior injected into the accessory's responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    None,
    /// Answer the request for this step with an Error item.
    RejectAt { step: u8, code: u8 },
    RetryAfter { seconds: u16 },
    OmitSalt,
    OmitPublicKey,
    WrongState,
    CorruptProof,
    CorruptSignature,
    CorruptCiphertext,
    /// Error item on the acknowledgement of an outbound fragment.
    RejectFragment,
}

pub(crate) struct MockAccessory {
    params: SrpParams,
    salt: [u8; 16],
    verifier: BigUint,
    private_key: BigUint,
    public_key: BigUint,
    identity: IdentityKeyPair,
    shared_secret: Option<Vec<u8>>,
    fault: Fault,
    fragment_size: Option<usize>,
    outbound: VecDeque<Vec<u8>>,
    inbound: Vec<u8>,
    /// Controller identifier and LTPK verified from M5.
    pub(crate) controller: Option<(Vec<u8>, Vec<u8>)>,
    pub(crate) acks_sent: usize,
    pub(crate) acks_received: usize,
}

impl MockAccessory {
    pub(crate) fn new(setup_code: &str) -> Self {
        let params = SrpParams::default();
        let mut salt = [0u8; 16];
        rand::RngCore::fill_bytes(&mut OsRng, &mut salt);

        let x = compute_x(&salt, setup_code.as_bytes());
        let verifier = params.g.modpow(&x, &params.n);
        let private_key = OsRng.gen_biguint(256);
        let k = compute_k(&params);
        let public_key = ((&k * &verifier) + params.g.modpow(&private_key, &params.n)) % &params.n;

        Self {
            params,
            salt,
            verifier,
            private_key,
            public_key,
            identity: IdentityKeyPair::generate(),
            shared_secret: None,
            fault: Fault::None,
            fragment_size: None,
            outbound: VecDeque::new(),
            inbound: Vec::new(),
            controller: None,
            acks_sent: 0,
            acks_received: 0,
        }
    }

    pub(crate) fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    /// Split response bodies larger than `size`.
    pub(crate) fn with_fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = Some(size);
        self
    }

    pub(crate) fn public_key(&self) -> [u8; 32] {
        self.identity.public_key()
    }

    pub(crate) fn respond(&mut self, request: &PairingRequest) -> PairingResponse {
        assert!(request.payload.return_response);
        let tlv = Tlv8::parse(request.body()).expect("controller sent malformed TLV");

        if let Some(chunk) = tlv.get(TlvType::FragmentData) {
            if chunk.is_empty() && !self.outbound.is_empty() {
                self.acks_received += 1;
                let next = self.outbound.pop_front().unwrap_or_default();
                return PairingResponse::new(next);
            }
            self.inbound.extend_from_slice(chunk);
            self.acks_sent += 1;
            let ack = if self.fault == Fault::RejectFragment {
                Tlv8::new().with(TlvType::Error, vec![0x01]).encode()
            } else {
                FragmentCodec::acknowledgement()
            };
            return PairingResponse::new(ack);
        }

        let body = match tlv.get(TlvType::FragmentLast) {
            Some(last) => {
                let mut body = std::mem::take(&mut self.inbound);
                body.extend_from_slice(last);
                Tlv8::parse(&body).expect("reassembled body is malformed")
            }
            None => tlv,
        };

        let step = body.state().unwrap_or(0) + 1;
        let response = match self.fault {
            Fault::RejectAt { step: s, code } if s == step => error_body(step, code),
            Fault::RetryAfter { seconds } if step == 2 => error_body(step, 0x03)
                .with(TlvType::RetryDelay, seconds.to_le_bytes().to_vec()),
            _ => match step {
                2 => self.srp_start(),
                4 => self.srp_verify(&body),
                6 => self.exchange(&body),
                _ => error_body(step, 0x01),
            },
        };
        self.send(response.encode())
    }

    fn send(&mut self, body: Vec<u8>) -> PairingResponse {
        match self.fragment_size {
            Some(size) if body.len() > size => {
                let mut chunks: VecDeque<_> = FragmentCodec::split_outbound(&body, size).into();
                let first = chunks.pop_front().unwrap_or_default();
                self.outbound = chunks;
                PairingResponse::new(first)
            }
            _ => PairingResponse::new(body),
        }
    }

    fn srp_start(&mut self) -> Tlv8 {
        let state = if self.fault == Fault::WrongState { 4 } else { 2 };
        let mut tlv = Tlv8::new().with(TlvType::State, vec![state]);
        if self.fault != Fault::OmitSalt {
            tlv.set(TlvType::Salt, self.salt.to_vec());
        }
        if self.fault != Fault::OmitPublicKey {
            tlv.set(TlvType::PublicKey, pad_to_n(&self.public_key));
        }
        tlv
    }

    fn srp_verify(&mut self, request: &Tlv8) -> Tlv8 {
        let a_bytes = request.get(TlvType::PublicKey).expect("M3 without PublicKey");
        let client_proof = request.get(TlvType::Proof).expect("M3 without Proof");
        let a = BigUint::from_bytes_be(a_bytes);

        let u = compute_u(&a, &self.public_key);
        let base = (&a * self.verifier.modpow(&u, &self.params.n)) % &self.params.n;
        let s = base.modpow(&self.private_key, &self.params.n);
        let k = Sha512::digest(pad_to_n(&s)).to_vec();

        let expected = compute_m1(&self.params, &self.salt, &a, &self.public_key, &k);
        if expected != client_proof {
            return error_body(4, 0x02);
        }

        let mut hasher = Sha512::new();
        hasher.update(pad_to_n(&a));
        hasher.update(client_proof);
        hasher.update(&k);
        let mut proof = hasher.finalize().to_vec();
        if self.fault == Fault::CorruptProof {
            proof[0] ^= 0x01;
        }

        self.shared_secret = Some(k);
        Tlv8::new()
            .with(TlvType::State, vec![4])
            .with(TlvType::Proof, proof)
    }

    fn exchange(&mut self, request: &Tlv8) -> Tlv8 {
        let k = self.shared_secret.clone().expect("M5 before M3");
        let key = derive(&k, b"Pair-Setup-Encrypt-Salt", b"Pair-Setup-Encrypt-Info");

        let encrypted = request.get(TlvType::EncryptedData).expect("M5 without EncryptedData");
        let Ok(plaintext) = decrypt_with_nonce(&key, &nonce_from_string(b"PS-Msg05"), encrypted)
        else {
            return error_body(6, 0x02);
        };
        let inner = Tlv8::parse(&plaintext).expect("M5 sub-TLV is malformed");
        let id = inner.get(TlvType::Identifier).unwrap_or_default().to_vec();
        let ltpk = inner.get(TlvType::PublicKey).unwrap_or_default().to_vec();
        let signature = inner.get(TlvType::Signature).unwrap_or_default();

        let controller_context = derive(
            &k,
            b"Pair-Setup-Controller-Sign-Salt",
            b"Pair-Setup-Controller-Sign-Info",
        );
        let material = [&controller_context[..], &id[..], &ltpk[..]].concat();
        if ed25519::verify(&ltpk, &material, signature).is_err() {
            return error_body(6, 0x02);
        }
        self.controller = Some((id, ltpk));

        let accessory_context = derive(
            &k,
            b"Pair-Setup-Accessory-Sign-Salt",
            b"Pair-Setup-Accessory-Sign-Info",
        );
        let ltpk = self.identity.public_key();
        let material = [&accessory_context[..], ACCESSORY_PAIRING_ID, &ltpk[..]].concat();
        let mut signature = self.identity.sign(&material);
        if self.fault == Fault::CorruptSignature {
            signature[10] ^= 0x01;
        }

        let inner = Tlv8::new()
            .with(TlvType::Identifier, ACCESSORY_PAIRING_ID.to_vec())
            .with(TlvType::PublicKey, ltpk.to_vec())
            .with(TlvType::Signature, signature.to_vec());
        let mut sealed = encrypt_with_nonce(&key, &nonce_from_string(b"PS-Msg06"), &inner.encode())
            .expect("seal M6");
        if self.fault == Fault::CorruptCiphertext {
            sealed[3] ^= 0x01;
        }

        Tlv8::new()
            .with(TlvType::State, vec![6])
            .with(TlvType::EncryptedData, sealed)
    }
}

fn error_body(step: u8, code: u8) -> Tlv8 {
    Tlv8::new()
        .with(TlvType::State, vec![step])
        .with(TlvType::Error, vec![code])
}

fn derive(ikm: &[u8], salt: &[u8], info: &[u8]) -> [u8; 32] {
    let mut okm = [0u8; 32];
    Hkdf::<Sha512>::new(Some(salt), ikm)
        .expand(info, &mut okm)
        .expect("32 bytes is a valid HKDF-SHA512 length");
    okm
}

fn compute_x(salt: &[u8], password: &[u8]) -> BigUint {
    let inner = Sha512::new()
        .chain_update(PAIR_SETUP_IDENTITY)
        .chain_update(b":")
        .chain_update(password)
        .finalize();
    BigUint::from_bytes_be(&Sha512::new().chain_update(salt).chain_update(inner).finalize())
}

fn compute_k(params: &SrpParams) -> BigUint {
    BigUint::from_bytes_be(
        &Sha512::new()
            .chain_update(pad_to_n(&params.n))
            .chain_update(pad_to_n(&params.g))
            .finalize(),
    )
}

fn compute_u(a: &BigUint, b: &BigUint) -> BigUint {
    BigUint::from_bytes_be(
        &Sha512::new()
            .chain_update(pad_to_n(a))
            .chain_update(pad_to_n(b))
            .finalize(),
    )
}

fn compute_m1(params: &SrpParams, salt: &[u8], a: &BigUint, b: &BigUint, k: &[u8]) -> Vec<u8> {
    let h_n = Sha512::digest(pad_to_n(&params.n));
    let h_g = Sha512::digest(params.g.to_bytes_be());
    let xor: Vec<u8> = h_n.iter().zip(h_g.iter()).map(|(n, g)| n ^ g).collect();

    Sha512::new()
        .chain_update(xor)
        .chain_update(Sha512::digest(PAIR_SETUP_IDENTITY))
        .chain_update(salt)
        .chain_update(pad_to_n(a))
        .chain_update(pad_to_n(b))
        .chain_update(k)
        .finalize()
        .to_vec()
}
