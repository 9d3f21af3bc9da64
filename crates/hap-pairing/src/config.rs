//! Pair-setup configuration.

use hap_core::{CharacteristicAddress, ConfigError};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Largest accepted outbound fragment payload.
pub const MAX_FRAGMENT_SIZE: usize = u16::MAX as usize;

/// Default time to wait for each accessory response.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Codes HomeKit forbids accessories from using.
const DISALLOWED_CODES: &[&str] = &[
    "000-00-000",
    "111-11-111",
    "222-22-222",
    "333-33-333",
    "444-44-444",
    "555-55-555",
    "666-66-666",
    "777-77-777",
    "888-88-888",
    "999-99-999",
    "123-45-678",
    "876-54-321",
];

/// Accessory setup code in `XXX-XX-XXX` form.
///
/// Used verbatim as the SRP password. Eight bare digits are accepted and
/// normalized to the dashed form.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SetupCode(String);

impl SetupCode {
    /// Validate and normalize a setup code.
    pub fn parse(code: &str) -> Result<Self, ConfigError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ConfigError::MissingSetupCode);
        }

        let normalized = match code.len() {
            8 if code.bytes().all(|b| b.is_ascii_digit()) => {
                format!("{}-{}-{}", &code[..3], &code[3..5], &code[5..])
            }
            10 => code.to_string(),
            _ => {
                return Err(ConfigError::InvalidSetupCode(
                    "expected XXX-XX-XXX".to_string(),
                ))
            }
        };

        let well_formed = normalized.bytes().enumerate().all(|(i, b)| match i {
            3 | 6 => b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !well_formed {
            return Err(ConfigError::InvalidSetupCode(
                "expected XXX-XX-XXX".to_string(),
            ));
        }

        if DISALLOWED_CODES.contains(&normalized.as_str()) {
            return Err(ConfigError::InvalidSetupCode(
                "trivial setup codes are not allowed".to_string(),
            ));
        }

        Ok(Self(normalized))
    }

    /// Code as used for the SRP password.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SetupCode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for SetupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SetupCode(***-**-***)")
    }
}

/// Settings for one pair-setup session.
#[derive(Debug, Clone)]
pub struct PairSetupConfig {
    /// Accessory setup code.
    pub setup_code: SetupCode,
    /// Pairing characteristic written to.
    pub address: CharacteristicAddress,
    /// Split outbound bodies larger than this into fragments.
    pub max_fragment_size: Option<usize>,
    /// Time allowed for each accessory response when driven asynchronously.
    pub response_timeout: Duration,
}

impl PairSetupConfig {
    /// Configuration with defaults for everything but the setup code.
    pub fn new(setup_code: SetupCode) -> Self {
        Self {
            setup_code,
            address: CharacteristicAddress::pair_setup(),
            max_fragment_size: None,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn builder() -> PairSetupConfigBuilder {
        PairSetupConfigBuilder::default()
    }
}

/// Builder for [`PairSetupConfig`].
#[derive(Default)]
pub struct PairSetupConfigBuilder {
    setup_code: Option<String>,
    address: Option<CharacteristicAddress>,
    max_fragment_size: Option<usize>,
    response_timeout: Option<Duration>,
}

impl PairSetupConfigBuilder {
    /// Set the accessory setup code.
    pub fn setup_code(mut self, code: impl Into<String>) -> Self {
        self.setup_code = Some(code.into());
        self
    }

    /// Target a characteristic other than the standard pair-setup one.
    pub fn address(mut self, address: CharacteristicAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Fragment outbound bodies larger than `size` bytes.
    pub fn max_fragment_size(mut self, size: usize) -> Self {
        self.max_fragment_size = Some(size);
        self
    }

    /// Set the per-response timeout.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Validate and build the configuration.
    pub fn build(mut self) -> Result<PairSetupConfig, ConfigError> {
        let mut raw_code = self.setup_code.take().ok_or(ConfigError::MissingSetupCode)?;
        let setup_code = SetupCode::parse(&raw_code);
        raw_code.zeroize();
        let setup_code = setup_code?;

        if let Some(size) = self.max_fragment_size {
            if size == 0 || size > MAX_FRAGMENT_SIZE {
                return Err(ConfigError::InvalidFragmentSize {
                    max: MAX_FRAGMENT_SIZE,
                    actual: size,
                });
            }
        }

        Ok(PairSetupConfig {
            setup_code,
            address: self.address.unwrap_or_default(),
            max_fragment_size: self.max_fragment_size,
            response_timeout: self.response_timeout.unwrap_or(DEFAULT_RESPONSE_TIMEOUT),
        })
    }
}
