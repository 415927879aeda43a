//! Types for the transfer engine seam.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a transfer engine backend.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The engine session could not be initialized.
    #[error("engine initialization failed: {0}")]
    InitFailed(String),

    /// The source descriptor could not be added to the session.
    #[error("failed to add transfer source: {0}")]
    AddFailed(String),

    /// Metadata did not resolve within the configured timeout.
    #[error("timed out waiting for transfer metadata after {timeout_secs}s")]
    MetadataTimeout { timeout_secs: u64 },

    /// The transfer id is not known to the engine.
    #[error("transfer not found: {0}")]
    NotFound(String),

    /// The engine reported a fault for an active transfer.
    #[error("engine error: {0}")]
    Engine(String),
}

/// One poll's view of an active transfer, as reported by the engine.
#[derive(Debug, Clone, Default)]
pub struct TransferSnapshot {
    /// Whether the torrent metadata has resolved yet.
    pub has_metadata: bool,
    /// Item name, once resolvable.
    pub name: Option<String>,
    /// Fractional completion in [0, 1].
    pub progress: f64,
    /// Instantaneous download rate in bytes/second.
    pub download_rate_bps: u64,
    /// Whether the engine reports the transfer fully acquired.
    pub finished: bool,
}

/// Poll-loop tuning for the transfer runner.
///
/// Kept as configuration rather than constants so the policy can be
/// exercised with a fake engine and a short interval in tests.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay between engine polls.
    pub interval: Duration,
    /// Consecutive poll failures tolerated before the run is failed.
    pub max_consecutive_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_consecutive_failures: 5,
        }
    }
}

/// A peer-to-peer transfer engine backend.
///
/// The orchestration core only ever sees this handle-shaped surface:
/// begin a transfer for a magnet URI, then poll it by id.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Binds a magnet URI to the session and returns the transfer id.
    ///
    /// May block until metadata resolves, bounded by the backend's
    /// configured timeout; the runner keeps the job in `Starting` while
    /// this is pending.
    async fn begin(&self, magnet_uri: &str) -> Result<String, TransferError>;

    /// Reads the current state of an active transfer.
    async fn poll(&self, transfer_id: &str) -> Result<TransferSnapshot, TransferError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_policy_defaults() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_millis(1000));
        assert_eq!(policy.max_consecutive_failures, 5);
    }

    #[test]
    fn test_error_display() {
        let err = TransferError::MetadataTimeout { timeout_secs: 60 };
        assert_eq!(
            err.to_string(),
            "timed out waiting for transfer metadata after 60s"
        );

        let err = TransferError::Engine("tracker unreachable".to_string());
        assert_eq!(err.to_string(), "engine error: tracker unreachable");
    }
}
