//! librqbit embedded transfer engine implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use librqbit::{
    AddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session, SessionOptions,
    TorrentStatsState,
};
use tracing::{debug, info};

use super::types::{TransferEngine, TransferError, TransferSnapshot};
use crate::config::TransferConfig;

/// Embedded librqbit engine bound to the managed download directory.
pub struct LibrqbitEngine {
    session: Arc<Session>,
    metadata_timeout: Duration,
}

impl LibrqbitEngine {
    /// Creates a new engine from configuration.
    pub async fn new(config: &TransferConfig, download_dir: &Path) -> Result<Self, TransferError> {
        let download_path = PathBuf::from(download_dir);

        if !download_path.exists() {
            std::fs::create_dir_all(&download_path).map_err(|e| {
                TransferError::InitFailed(format!("failed to create download directory: {}", e))
            })?;
        }

        let mut opts = SessionOptions::default();

        if !config.enable_dht {
            opts.disable_dht = true;
        }

        // Range, not RangeInclusive
        if let Some(port) = config.listen_port {
            opts.listen_port_range = Some(port..(port + 1));
        }

        info!(
            download_path = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path, opts)
            .await
            .map_err(|e| {
                TransferError::InitFailed(format!("failed to initialize librqbit session: {}", e))
            })?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port = port, "librqbit listening on TCP port");
        }

        Ok(Self {
            session,
            metadata_timeout: Duration::from_secs(config.metadata_timeout_secs),
        })
    }

    /// Format info hash as lowercase hex string.
    fn format_hash(hash: &librqbit_core::Id20) -> String {
        hash.as_string()
    }

    /// Find a torrent by hash.
    fn find_torrent(&self, hash: &str) -> Option<Arc<ManagedTorrent>> {
        let hash_lower = hash.to_lowercase();

        self.session.with_torrents(|iter| {
            for (_, torrent) in iter {
                if Self::format_hash(&torrent.info_hash()) == hash_lower {
                    return Some(torrent.clone());
                }
            }
            None
        })
    }
}

#[async_trait]
impl TransferEngine for LibrqbitEngine {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn begin(&self, magnet_uri: &str) -> Result<String, TransferError> {
        // DHT lookup can take forever for rare torrents, so the
        // metadata wait is bounded by the configured timeout.
        let add_future = self
            .session
            .add_torrent(AddTorrent::from_url(magnet_uri), None::<AddTorrentOptions>);

        let response = tokio::time::timeout(self.metadata_timeout, add_future)
            .await
            .map_err(|_| TransferError::MetadataTimeout {
                timeout_secs: self.metadata_timeout.as_secs(),
            })?
            .map_err(|e| TransferError::AddFailed(e.to_string()))?;

        match response {
            AddTorrentResponse::Added(_, handle) => {
                let hash = Self::format_hash(&handle.info_hash());
                debug!(hash = %hash, name = ?handle.name(), "Transfer added");
                Ok(hash)
            }
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                let hash = Self::format_hash(&handle.info_hash());
                debug!(hash = %hash, "Transfer already managed, reusing");
                Ok(hash)
            }
            AddTorrentResponse::ListOnly(_) => Err(TransferError::AddFailed(
                "torrent was added in list-only mode".to_string(),
            )),
        }
    }

    async fn poll(&self, transfer_id: &str) -> Result<TransferSnapshot, TransferError> {
        let torrent = self
            .find_torrent(transfer_id)
            .ok_or_else(|| TransferError::NotFound(transfer_id.to_string()))?;

        let stats = torrent.stats();

        if matches!(stats.state, TorrentStatsState::Error) {
            return Err(TransferError::Engine(
                "session reports the transfer in an error state".to_string(),
            ));
        }

        let name = torrent.name().map(|s| s.to_string());
        let has_metadata = name.is_some() || stats.total_bytes > 0;

        let progress = if stats.total_bytes > 0 {
            stats.progress_bytes as f64 / stats.total_bytes as f64
        } else {
            0.0
        };

        // Despite the field name "mbps", librqbit stores MiB/s, as its
        // Display impl shows: write!(f, "{:.2} MiB/s", self.mbps)
        let download_rate_bps = stats
            .live
            .as_ref()
            .map(|live| (live.download_speed.mbps * 1024.0 * 1024.0) as u64)
            .unwrap_or(0);

        Ok(TransferSnapshot {
            has_metadata,
            name,
            progress,
            download_rate_bps,
            finished: stats.finished,
        })
    }
}
