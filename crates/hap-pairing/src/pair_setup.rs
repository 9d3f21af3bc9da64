//! HomeKit pair-setup session (M1-M6), controller side.
//!
//! The session is a pull/push state machine with no I/O: the driver asks it
//! for the next [`PairingRequest`], delivers it, and feeds the accessory's
//! [`PairingResponse`] back. Failures never escape as errors from those two
//! calls; they are recorded on the session and end it.
//!
//! `state` counts completed protocol messages: even values mean the session
//! is ready to emit M(state + 1), odd values mean M(state) is outstanding.
//! Fragment acknowledgements and outbound continuation chunks are extra
//! round trips that do not move `state`.

use std::collections::VecDeque;

use hap_core::error::describe_accessory_error;
use hap_core::{
    AttributeDirectory, Cid, Error, PairingError, PairingRequest, PairingResponse, Result,
};
use hap_crypto::chacha::ChaChaPoly;
use hap_crypto::keys::EncryptionKey;
use hap_crypto::srp::{SrpChallenge, SrpClient, SrpParams, PAIR_SETUP_IDENTITY};
use hap_crypto::tlv::Tlv8;
use hap_crypto::traits::{Ed25519Verifier, PakeClient};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::PairSetupConfig;
use crate::controller::ControllerIdentity;
use crate::exchange::{self, AccessoryIdentity};
use crate::fragment::{FragmentCodec, Inbound};
use crate::key_schedule::KeySchedule;
use crate::messages::{
    ExchangeRequest, ExchangeResponse, SrpStartResponse, SrpVerifyRequest, SrpVerifyResponse,
    StartRequest,
};
use crate::result::PairingResult;

/// Final protocol state.
const COMPLETE: u8 = 6;

/// Controller-side pair-setup state machine.
pub struct PairSetup {
    state: u8,
    config: PairSetupConfig,
    cid: Cid,
    /// SRP private exponent, fixed for the life of the session.
    ephemeral_secret: Zeroizing<[u8; 32]>,
    challenge: Option<SrpStartResponse>,
    pake: Option<Box<dyn PakeClient>>,
    session_key: Option<EncryptionKey>,
    controller: Option<ControllerIdentity>,
    accessory: Option<AccessoryIdentity>,
    fragments: FragmentCodec,
    pending_ack: bool,
    outbound: VecDeque<Vec<u8>>,
    error: Option<PairingError>,
    result: Option<PairingResult>,
}

impl PairSetup {
    /// Create a session writing to characteristic `cid`.
    pub fn new(config: PairSetupConfig, cid: Cid) -> Self {
        let mut ephemeral_secret = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut ephemeral_secret[..]);

        debug!(address = %config.address, cid, "Created pair-setup session");
        Self {
            state: 0,
            config,
            cid,
            ephemeral_secret,
            challenge: None,
            pake: None,
            session_key: None,
            controller: None,
            accessory: None,
            fragments: FragmentCodec::new(),
            pending_ack: false,
            outbound: VecDeque::new(),
            error: None,
            result: None,
        }
    }

    /// Create a session, resolving the pairing characteristic in `directory`.
    pub fn from_directory(
        config: PairSetupConfig,
        directory: &dyn AttributeDirectory,
    ) -> Result<Self> {
        let cid = directory
            .characteristic_id(&config.address)
            .ok_or_else(|| Error::UnknownCharacteristic(config.address.to_string()))?;
        Ok(Self::new(config, cid))
    }

    /// Number of protocol messages completed (0-6).
    pub fn state(&self) -> u8 {
        self.state
    }

    pub fn config(&self) -> &PairSetupConfig {
        &self.config
    }

    pub fn cid(&self) -> Cid {
        self.cid
    }

    /// Terminal failure, if any.
    pub fn error(&self) -> Option<&PairingError> {
        self.error.as_ref()
    }

    /// Pairing data, once M6 has been verified.
    pub fn result(&self) -> Option<&PairingResult> {
        self.result.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Identity generated for M5.
    pub fn controller(&self) -> Option<&ControllerIdentity> {
        self.controller.as_ref()
    }

    /// Accessory identity verified from M6.
    pub fn accessory(&self) -> Option<&AccessoryIdentity> {
        self.accessory.as_ref()
    }

    /// True while the driver should keep exchanging messages.
    pub fn has_more_requests(&self) -> bool {
        self.error.is_none() && (self.state < COMPLETE || self.pending_ack)
    }

    /// Next body to write to the pairing characteristic.
    ///
    /// Returns `None` once the session has ended, or if it fails while
    /// building the message (the failure is then available from
    /// [`PairSetup::error`]).
    pub fn next_request(&mut self) -> Option<PairingRequest> {
        if !self.has_more_requests() {
            warn!(state = self.state, "No further pair-setup requests");
            return None;
        }

        if self.pending_ack {
            self.pending_ack = false;
            debug!(
                buffered = self.fragments.buffered_len(),
                "Acknowledging response fragment"
            );
            return Some(self.request(FragmentCodec::acknowledgement()));
        }

        if let Some(chunk) = self.outbound.pop_front() {
            debug!(remaining = self.outbound.len(), "Sending request fragment");
            return Some(self.request(chunk));
        }

        if self.state % 2 == 1 {
            self.fail(PairingError::InvalidState(format!(
                "M{} is still awaiting a response",
                self.state
            )));
            return None;
        }

        let built = match self.state {
            0 => Ok(self.build_start()),
            2 => self.build_srp_verify(),
            4 => self.build_exchange(),
            _ => Err(PairingError::InvalidState(format!(
                "no request follows state {}",
                self.state
            ))),
        };

        match built {
            Ok(body) => {
                self.state += 1;
                debug!(step = self.state, len = body.len(), "Sending pair-setup request");
                Some(self.enqueue(body))
            }
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Process a response body from the accessory.
    pub fn handle_response(&mut self, response: &PairingResponse) {
        if !self.has_more_requests() {
            warn!(state = self.state, "Ignoring response for finished pair-setup session");
            return;
        }

        if self.state % 2 == 0 || self.pending_ack {
            self.fail(PairingError::InvalidState(format!(
                "unexpected response in state {}",
                self.state
            )));
            return;
        }

        if !self.outbound.is_empty() {
            self.handle_fragment_ack(&response.value);
            return;
        }

        let body = match self.fragments.decode_inbound(&response.value) {
            Ok(Inbound::MoreDataNeeded) => {
                self.pending_ack = true;
                debug!(
                    buffered = self.fragments.buffered_len(),
                    "Received response fragment"
                );
                return;
            }
            Ok(Inbound::Complete(body)) => body,
            Err(e) => {
                self.fail(e.into());
                return;
            }
        };

        self.state += 1;
        debug!(step = self.state, "Received pair-setup response");

        if let Some(code) = body.error() {
            self.abort(code, body.retry_delay());
            return;
        }

        let handled = match self.state {
            2 => self.handle_srp_start(&body),
            4 => self.handle_srp_verify(&body),
            COMPLETE => self.handle_exchange(&body),
            _ => Err(PairingError::InvalidState(format!(
                "no response expected in state {}",
                self.state
            ))),
        };

        if let Err(e) = handled {
            self.fail(e);
        }
    }

    /// Take the outcome, dropping all session secrets.
    pub fn into_result(self) -> Result<PairingResult> {
        if let Some(error) = self.error {
            return Err(Error::PairingFailed(error));
        }
        self.result
            .ok_or(Error::PairingFailed(PairingError::Incomplete))
    }

    fn request(&self, body: Vec<u8>) -> PairingRequest {
        PairingRequest::write(self.config.address.clone(), self.cid, body)
    }

    /// Queue `body` for sending, returning the first wire request.
    fn enqueue(&mut self, body: Vec<u8>) -> PairingRequest {
        let mut chunks: VecDeque<Vec<u8>> = match self.config.max_fragment_size {
            Some(max) => FragmentCodec::split_outbound(&body, max).into(),
            None => VecDeque::from([body]),
        };
        let first = chunks.pop_front().unwrap_or_default();
        if !chunks.is_empty() {
            debug!(fragments = chunks.len() + 1, "Fragmenting pair-setup request");
        }
        self.outbound = chunks;
        self.request(first)
    }

    fn handle_fragment_ack(&mut self, raw: &[u8]) {
        match Tlv8::parse(raw) {
            Ok(tlv) => match tlv.error() {
                Some(code) => self.abort(code, tlv.retry_delay()),
                None => debug!(remaining = self.outbound.len(), "Request fragment acknowledged"),
            },
            Err(e) => self.fail(e.into()),
        }
    }

    fn abort(&mut self, code: u8, retry_delay: Option<u16>) {
        let step = if self.state % 2 == 1 {
            self.state + 1
        } else {
            self.state
        };
        warn!(
            step,
            code,
            reason = describe_accessory_error(code),
            retry_delay_secs = ?retry_delay,
            "Accessory rejected pair-setup"
        );
        self.fail(PairingError::ProtocolAbort { step, code });
    }

    fn fail(&mut self, error: PairingError) {
        warn!(state = self.state, error = %error, "Pair-setup failed");
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.outbound.clear();
        self.pending_ack = false;
        self.challenge = None;
        self.pake = None;
        self.session_key = None;
    }

    /// M1: {State=1, Method=1}
    fn build_start(&self) -> Vec<u8> {
        info!("Starting pair-setup");
        StartRequest.to_tlv().encode()
    }

    /// M2: {State=2, Salt, PublicKey}
    fn handle_srp_start(&mut self, body: &Tlv8) -> std::result::Result<(), PairingError> {
        let challenge = SrpStartResponse::parse(body)?;
        debug!(
            salt_len = challenge.salt.len(),
            public_key_len = challenge.public_key.len(),
            "Received SRP challenge"
        );
        self.challenge = Some(challenge);
        Ok(())
    }

    /// M3: {State=3, PublicKey, Proof}
    fn build_srp_verify(&mut self) -> std::result::Result<Vec<u8>, PairingError> {
        let challenge = self
            .challenge
            .take()
            .ok_or_else(|| PairingError::InvalidState("SRP challenge not received".into()))?;

        let client = SrpClient::new(
            SrpParams::default(),
            PAIR_SETUP_IDENTITY,
            self.config.setup_code.as_str().as_bytes(),
            &self.ephemeral_secret[..],
            &SrpChallenge {
                salt: &challenge.salt,
                server_public_key: &challenge.public_key,
            },
        )?;

        let request = SrpVerifyRequest {
            public_key: client.public_key(),
            proof: client.client_proof().to_vec(),
        };
        self.pake = Some(Box::new(client));
        Ok(request.to_tlv().encode())
    }

    /// M4: {State=4, Proof}
    fn handle_srp_verify(&mut self, body: &Tlv8) -> std::result::Result<(), PairingError> {
        let response = SrpVerifyResponse::parse(body)?;
        let pake = self
            .pake
            .as_ref()
            .ok_or_else(|| PairingError::InvalidState("SRP exchange not started".into()))?;

        pake.verify_server_proof(&response.proof)
            .map_err(|_| PairingError::ProofMismatch)?;
        info!("Accessory SRP proof verified");
        Ok(())
    }

    /// M5: {State=5, EncryptedData}
    fn build_exchange(&mut self) -> std::result::Result<Vec<u8>, PairingError> {
        let pake = self
            .pake
            .as_ref()
            .ok_or_else(|| PairingError::InvalidState("SRP exchange not completed".into()))?;
        let schedule = KeySchedule::new(pake.shared_secret());
        let context = schedule.controller_sign_context()?;
        let session_key = schedule.encryption_key()?;

        let controller = ControllerIdentity::generate();
        let aead = ChaChaPoly::new(session_key.clone());
        let encrypted_data =
            exchange::seal_controller_proof(&context[..], controller.id_bytes(), &controller, &aead)?;
        debug!(controller_id = controller.id(), "Generated controller identity");

        self.session_key = Some(session_key);
        self.controller = Some(controller);
        Ok(ExchangeRequest { encrypted_data }.to_tlv().encode())
    }

    /// M6: {State=6, EncryptedData}
    fn handle_exchange(&mut self, body: &Tlv8) -> std::result::Result<(), PairingError> {
        let response = ExchangeResponse::parse(body)?;
        let (Some(pake), Some(session_key), Some(controller)) =
            (self.pake.as_ref(), self.session_key.as_ref(), self.controller.as_ref())
        else {
            return Err(PairingError::InvalidState(
                "key exchange response before request".into(),
            ));
        };

        let context = KeySchedule::new(pake.shared_secret()).accessory_sign_context()?;
        let aead = ChaChaPoly::new(session_key.clone());
        let accessory = exchange::open_accessory_proof(
            &context[..],
            &response.encrypted_data,
            &aead,
            &Ed25519Verifier,
        )?;

        info!(
            accessory_id = %String::from_utf8_lossy(&accessory.pairing_id),
            "Pair-setup complete"
        );
        self.result = Some(PairingResult::new(controller, &accessory));
        self.accessory = Some(accessory);
        Ok(())
    }
}

impl std::fmt::Debug for PairSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairSetup")
            .field("state", &self.state)
            .field("cid", &self.cid)
            .field("error", &self.error)
            .field("complete", &self.result.is_some())
            .finish_non_exhaustive()
    }
}
