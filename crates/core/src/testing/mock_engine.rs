//! Mock transfer engine for testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::transfer::{TransferEngine, TransferError, TransferSnapshot};

/// Scripted implementation of the [`TransferEngine`] trait.
///
/// Each `poll` pops the next scripted result; when the script runs dry
/// the last successful snapshot is repeated, so a script ending in a
/// `finished` snapshot behaves like a seeding torrent.
///
/// # Example
///
/// ```rust,ignore
/// let engine = MockTransferEngine::new();
/// engine.push_snapshot(TransferSnapshot {
///     has_metadata: true,
///     name: Some("movie".into()),
///     progress: 0.5,
///     download_rate_bps: 1_000_000,
///     finished: false,
/// }).await;
/// engine.push_finished("movie").await;
/// ```
pub struct MockTransferEngine {
    begun: Arc<RwLock<Vec<String>>>,
    script: Arc<RwLock<VecDeque<Result<TransferSnapshot, TransferError>>>>,
    last: Arc<RwLock<TransferSnapshot>>,
    begin_error: Arc<RwLock<Option<TransferError>>>,
    begin_delay: Duration,
}

impl Default for MockTransferEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransferEngine {
    pub fn new() -> Self {
        Self {
            begun: Arc::new(RwLock::new(Vec::new())),
            script: Arc::new(RwLock::new(VecDeque::new())),
            last: Arc::new(RwLock::new(TransferSnapshot::default())),
            begin_error: Arc::new(RwLock::new(None)),
            begin_delay: Duration::ZERO,
        }
    }

    /// Delays `begin` to simulate slow metadata resolution.
    pub fn with_begin_delay(mut self, delay: Duration) -> Self {
        self.begin_delay = delay;
        self
    }

    /// Appends a successful poll result to the script.
    pub async fn push_snapshot(&self, snapshot: TransferSnapshot) {
        self.script.write().await.push_back(Ok(snapshot));
    }

    /// Appends a running snapshot at the given fraction.
    pub async fn push_progress(&self, name: &str, progress: f64, rate_bps: u64) {
        self.push_snapshot(TransferSnapshot {
            has_metadata: true,
            name: Some(name.to_string()),
            progress,
            download_rate_bps: rate_bps,
            finished: false,
        })
        .await;
    }

    /// Appends the terminal "fully acquired" snapshot.
    pub async fn push_finished(&self, name: &str) {
        self.push_snapshot(TransferSnapshot {
            has_metadata: true,
            name: Some(name.to_string()),
            progress: 1.0,
            download_rate_bps: 0,
            finished: true,
        })
        .await;
    }

    /// Appends a poll failure to the script.
    pub async fn push_poll_error(&self, error: TransferError) {
        self.script.write().await.push_back(Err(error));
    }

    /// Makes the next `begin` call fail.
    pub async fn set_begin_error(&self, error: TransferError) {
        *self.begin_error.write().await = Some(error);
    }

    /// Magnet URIs passed to `begin`, in call order.
    pub async fn begun_uris(&self) -> Vec<String> {
        self.begun.read().await.clone()
    }
}

#[async_trait]
impl TransferEngine for MockTransferEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn begin(&self, magnet_uri: &str) -> Result<String, TransferError> {
        if self.begin_delay > Duration::ZERO {
            tokio::time::sleep(self.begin_delay).await;
        }
        if let Some(err) = self.begin_error.write().await.take() {
            return Err(err);
        }
        self.begun.write().await.push(magnet_uri.to_string());
        Ok(format!("mock-{}", self.begun.read().await.len()))
    }

    async fn poll(&self, _transfer_id: &str) -> Result<TransferSnapshot, TransferError> {
        let next = self.script.write().await.pop_front();
        match next {
            Some(Ok(snapshot)) => {
                *self.last.write().await = snapshot.clone();
                Ok(snapshot)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.read().await.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_pops_in_order() {
        let engine = MockTransferEngine::new();
        engine.push_progress("a", 0.25, 100).await;
        engine.push_finished("a").await;

        let id = engine.begin("magnet:?xt=urn:btih:abc").await.unwrap();
        let first = engine.poll(&id).await.unwrap();
        assert!((first.progress - 0.25).abs() < f64::EPSILON);
        assert!(!first.finished);

        let second = engine.poll(&id).await.unwrap();
        assert!(second.finished);

        // Script exhausted: last snapshot repeats.
        let third = engine.poll(&id).await.unwrap();
        assert!(third.finished);
    }

    #[tokio::test]
    async fn test_begin_error_is_consumed() {
        let engine = MockTransferEngine::new();
        engine
            .set_begin_error(TransferError::AddFailed("nope".into()))
            .await;

        assert!(engine.begin("magnet:?xt=urn:btih:x").await.is_err());
        assert!(engine.begin("magnet:?xt=urn:btih:x").await.is_ok());
    }
}
