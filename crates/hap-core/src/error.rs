//! Error types for the HomeKit pair-setup controller.

use thiserror::Error;

/// Primary error type for all pairing operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Pairing failed: {0}")]
    PairingFailed(#[from] PairingError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Characteristic not found in attribute directory: {0}")]
    UnknownCharacteristic(String),

    #[error("Operation timed out")]
    Timeout,
}

/// Terminal failures recorded by a pair-setup session.
#[derive(Error, Debug)]
pub enum PairingError {
    #[error("Accessory aborted pairing at M{step} with error 0x{code:02x}")]
    ProtocolAbort { step: u8, code: u8 },

    #[error("M{step} response missing required field: {field}")]
    MalformedResponse { step: u8, field: &'static str },

    #[error("Accessory SRP proof verification failed")]
    ProofMismatch,

    #[error("Accessory long-term key signature verification failed")]
    SignatureInvalid,

    #[error("Authenticated decryption of accessory payload failed")]
    DecryptionFailed,

    #[error("Invalid pairing state: {0}")]
    InvalidState(String),

    #[error("Pairing has not completed")]
    Incomplete,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid SRP parameter: {0}")]
    InvalidSrpParameter(String),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Signature verification failed")]
    SignatureMismatch,

    #[error("Proof mismatch")]
    ProofMismatch,
}

/// Parsing errors for wire formats.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Configuration validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Setup code is required")]
    MissingSetupCode,

    #[error("Invalid setup code: {0}")]
    InvalidSetupCode(String),

    #[error("Fragment size must be between 1 and {max}, got {actual}")]
    InvalidFragmentSize { max: usize, actual: usize },
}

/// Human readable name for a pairing error code sent by the accessory.
pub fn describe_accessory_error(code: u8) -> &'static str {
    match code {
        0x01 => "Unknown",
        0x02 => "Authentication",
        0x03 => "Backoff (rate limited)",
        0x04 => "MaxPeers",
        0x05 => "MaxTries",
        0x06 => "Unavailable",
        0x07 => "Busy",
        _ => "Unknown error code",
    }
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
