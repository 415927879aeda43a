use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::transcode::TranscodeConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Managed directories for downloaded and converted files.
///
/// These are the only persisted state; job status lives in memory and
/// resets to Idle on restart.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_convert_dir")]
    pub convert_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            convert_dir: default_convert_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_convert_dir() -> PathBuf {
    PathBuf::from("converted")
}

/// Transfer engine and poll-loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferConfig {
    /// Fixed TCP listen port for the embedded session. When unset the
    /// session picks from its default range.
    #[serde(default)]
    pub listen_port: Option<u16>,

    /// Enable DHT for magnet resolution.
    #[serde(default = "default_true")]
    pub enable_dht: bool,

    /// How long to wait for magnet metadata before failing the run.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// Delay between engine polls (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Consecutive poll failures tolerated before the run is failed.
    #[serde(default = "default_max_poll_failures")]
    pub max_poll_failures: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            listen_port: None,
            enable_dht: default_true(),
            metadata_timeout_secs: default_metadata_timeout(),
            poll_interval_ms: default_poll_interval(),
            max_poll_failures: default_max_poll_failures(),
        }
    }
}

impl TransferConfig {
    /// Builds the runner's poll policy from this configuration.
    pub fn poll_policy(&self) -> crate::transfer::PollPolicy {
        crate::transfer::PollPolicy {
            interval: std::time::Duration::from_millis(self.poll_interval_ms),
            max_consecutive_failures: self.max_poll_failures,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_metadata_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_max_poll_failures() -> u32 {
    5
}
