//! Transfer confirmation polling.

use std::{env, time::Duration};

use tokio::time::Instant;

use crate::{
    client::{
        DestinationTransferStatus, PantosClient, ServiceNodeTransferStatus, TransferResponse,
        TransferStatus,
    },
    error::{Error, Result},
};

pub const TEST_TIMEOUT_VAR: &str = "PANTOS_TEST_TIMEOUT";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Which chains must report a confirmed transfer before polling stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationMode {
    SourceOnly,
    SourceAndDestination,
}

impl ConfirmationMode {
    /// Mode the scenarios currently run with.
    pub fn current() -> Self {
        // TODO: Switch to SourceAndDestination once we migrate off ethereum
        // contracts 1.1.2, which never reports destination confirmation.
        ConfirmationMode::SourceOnly
    }
}

/// Overall confirmation deadline, in seconds, from `PANTOS_TEST_TIMEOUT`.
pub fn test_timeout() -> Duration {
    env::var(TEST_TIMEOUT_VAR)
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// Poll the transfer status every five seconds until it reaches the
/// confirmation states required by `mode`, the deadline passes, or the
/// client reports an error. Client errors are never retried.
pub async fn wait_for_confirmation<C: PantosClient + ?Sized>(
    client: &C,
    source: crate::chain::Blockchain,
    response: &TransferResponse,
    mode: ConfirmationMode,
    timeout: Duration,
) -> Result<TransferStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        let status = client
            .transfer_status(source, &response.service_node_address, &response.task_id)
            .await?;
        println!("Token transfer status: {status:?}");
        if confirmed(&status, mode) {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            return Err(Error::ConfirmationTimeout(timeout.as_secs()));
        }
        println!("Waiting for transfer to be confirmed...");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn confirmed(status: &TransferStatus, mode: ConfirmationMode) -> bool {
    let source_confirmed =
        status.source_transfer_status == ServiceNodeTransferStatus::Confirmed;
    match mode {
        ConfirmationMode::SourceOnly => source_confirmed,
        ConfirmationMode::SourceAndDestination => {
            source_confirmed
                && status.destination_transfer_status == DestinationTransferStatus::Confirmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(
        source: ServiceNodeTransferStatus,
        destination: DestinationTransferStatus,
    ) -> TransferStatus {
        TransferStatus {
            source_transfer_status: source,
            destination_transfer_status: destination,
        }
    }

    #[test]
    fn source_only_ignores_the_destination() {
        let report = status(
            ServiceNodeTransferStatus::Confirmed,
            DestinationTransferStatus::Nothing,
        );
        assert!(confirmed(&report, ConfirmationMode::SourceOnly));
        assert!(!confirmed(&report, ConfirmationMode::SourceAndDestination));
    }

    #[test]
    fn both_chains_must_confirm_in_full_mode() {
        let report = status(
            ServiceNodeTransferStatus::Confirmed,
            DestinationTransferStatus::Confirmed,
        );
        assert!(confirmed(&report, ConfirmationMode::SourceAndDestination));
        let pending = status(
            ServiceNodeTransferStatus::Submitted,
            DestinationTransferStatus::Confirmed,
        );
        assert!(!confirmed(&pending, ConfirmationMode::SourceAndDestination));
    }

    #[test]
    fn timeout_env_var_overrides_the_default() {
        let _guard = crate::testing::env_lock().lock().unwrap();
        unsafe { env::remove_var(TEST_TIMEOUT_VAR) };
        assert_eq!(test_timeout(), Duration::from_secs(300));
        unsafe { env::set_var(TEST_TIMEOUT_VAR, "60") };
        assert_eq!(test_timeout(), Duration::from_secs(60));
        unsafe { env::set_var(TEST_TIMEOUT_VAR, "soon") };
        assert_eq!(test_timeout(), Duration::from_secs(300));
        unsafe { env::remove_var(TEST_TIMEOUT_VAR) };
    }

    #[test]
    fn non_terminal_source_states_keep_polling() {
        for source in [
            ServiceNodeTransferStatus::Accepted,
            ServiceNodeTransferStatus::Submitted,
            ServiceNodeTransferStatus::Reverted,
            ServiceNodeTransferStatus::Failed,
        ] {
            let report = status(source, DestinationTransferStatus::Nothing);
            assert!(!confirmed(&report, ConfirmationMode::SourceOnly));
        }
    }
}
