//! Async driver that runs a [`PairSetup`] session over a transport.

use std::time::Duration;

use async_trait::async_trait;
use hap_core::{AttributeDirectory, Error, PairingRequest, PairingResponse, Result};
use tracing::{debug, info};

use crate::config::PairSetupConfig;
use crate::pair_setup::PairSetup;
use crate::result::PairingResult;

/// Delivers pairing writes to the accessory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write `request` to the pairing characteristic and return the
    /// accessory's response body.
    async fn exchange(&mut self, request: &PairingRequest) -> Result<PairingResponse>;
}

/// Run `session` to completion, waiting at most `timeout` for each response.
///
/// SRP and signature work runs on the blocking pool.
pub async fn drive<T>(
    mut session: PairSetup,
    transport: &mut T,
    timeout: Duration,
) -> Result<PairingResult>
where
    T: Transport + ?Sized,
{
    while session.has_more_requests() {
        let (returned, request) = tokio::task::spawn_blocking(move || {
            let request = session.next_request();
            (session, request)
        })
        .await
        .map_err(|e| Error::Transport(format!("pairing task failed: {}", e)))?;
        session = returned;

        let Some(request) = request else {
            break;
        };
        debug!(state = session.state(), len = request.body().len(), "Writing pairing request");

        let response = tokio::time::timeout(timeout, transport.exchange(&request))
            .await
            .map_err(|_| Error::Timeout)??;

        session = tokio::task::spawn_blocking(move || {
            session.handle_response(&response);
            session
        })
        .await
        .map_err(|e| Error::Transport(format!("pairing task failed: {}", e)))?;
    }

    session.into_result()
}

/// Pair with the accessory behind `transport`.
///
/// Resolves the pairing characteristic in `directory` and uses the
/// configured response timeout.
pub async fn pair<T>(
    config: PairSetupConfig,
    directory: &dyn AttributeDirectory,
    transport: &mut T,
) -> Result<PairingResult>
where
    T: Transport + ?Sized,
{
    let timeout = config.response_timeout;
    let session = PairSetup::from_directory(config, directory)?;
    info!(cid = session.cid(), "Pairing with accessory");
    drive(session, transport, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_accessory::{Fault, MockAccessory};
    use hap_core::{CharacteristicAddress, Cid, PairingError};
    use std::collections::HashMap;

    const SETUP_CODE: &str = "031-45-154";

    fn config() -> PairSetupConfig {
        PairSetupConfig::builder()
            .setup_code(SETUP_CODE)
            .response_timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn directory() -> HashMap<CharacteristicAddress, Cid> {
        HashMap::from([(CharacteristicAddress::pair_setup(), 10)])
    }

    struct LoopbackTransport {
        accessory: MockAccessory,
        writes: usize,
    }

    #[async_trait]
    impl Transport for LoopbackTransport {
        async fn exchange(&mut self, request: &PairingRequest) -> Result<PairingResponse> {
            self.writes += 1;
            Ok(self.accessory.respond(request))
        }
    }

    mod loopback {
        use super::*;

        #[tokio::test]
        async fn pairs_with_accessory() {
            let mut transport = LoopbackTransport {
                accessory: MockAccessory::new(SETUP_CODE),
                writes: 0,
            };

            let result = pair(config(), &directory(), &mut transport).await.unwrap();

            assert_eq!(transport.writes, 3);
            assert_eq!(
                result.accessory_ltpk,
                hex::encode(transport.accessory.public_key())
            );
        }

        #[tokio::test]
        async fn fragmented_accessory_needs_extra_writes() {
            let mut transport = LoopbackTransport {
                accessory: MockAccessory::new(SETUP_CODE).with_fragment_size(128),
                writes: 0,
            };

            let session = PairSetup::new(config(), 10);
            drive(session, &mut transport, Duration::from_secs(5))
                .await
                .unwrap();

            assert!(transport.writes > 3);
        }

        #[tokio::test]
        async fn accessory_rejection_is_returned() {
            let mut transport = LoopbackTransport {
                accessory: MockAccessory::new(SETUP_CODE)
                    .with_fault(Fault::RejectAt { step: 4, code: 0x02 }),
                writes: 0,
            };

            let err = pair(config(), &directory(), &mut transport).await.unwrap_err();
            assert!(matches!(
                err,
                Error::PairingFailed(PairingError::ProtocolAbort { step: 4, code: 0x02 })
            ));
            assert_eq!(transport.writes, 2);
        }

        #[tokio::test]
        async fn unknown_characteristic_fails_before_writing() {
            let mut transport = LoopbackTransport {
                accessory: MockAccessory::new(SETUP_CODE),
                writes: 0,
            };

            let err = pair(config(), &HashMap::<CharacteristicAddress, Cid>::new(), &mut transport)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::UnknownCharacteristic(_)));
            assert_eq!(transport.writes, 0);
        }
    }

    mod mock_transport {
        use super::*;

        #[tokio::test]
        async fn transport_error_is_propagated() {
            let mut mock = MockTransport::new();
            mock.expect_exchange()
                .times(1)
                .returning(|_| Err(Error::Transport("connection reset".into())));

            let session = PairSetup::new(config(), 10);
            let err = drive(session, &mut mock, Duration::from_secs(1))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Transport(_)));
        }

        #[tokio::test]
        async fn first_write_is_m1() {
            let mut mock = MockTransport::new();
            mock.expect_exchange()
                .withf(|request: &PairingRequest| {
                    request.body() == [0x06, 0x01, 0x01, 0x00, 0x01, 0x01]
                })
                .times(1)
                .returning(|_| Ok(PairingResponse::new(vec![0x06, 0x01, 0x02, 0x07, 0x01, 0x06])));

            let session = PairSetup::new(config(), 10);
            let err = drive(session, &mut mock, Duration::from_secs(1))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                Error::PairingFailed(PairingError::ProtocolAbort { step: 2, code: 0x06 })
            ));
        }
    }

    mod timeout {
        use super::*;

        struct SilentTransport;

        #[async_trait]
        impl Transport for SilentTransport {
            async fn exchange(&mut self, _request: &PairingRequest) -> Result<PairingResponse> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(PairingResponse::default())
            }
        }

        #[tokio::test]
        async fn slow_accessory_times_out() {
            let session = PairSetup::new(config(), 10);
            let err = drive(session, &mut SilentTransport, Duration::from_millis(20))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Timeout));
        }
    }
}
