//! Accepts job-start requests and spawns runners.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::types::{StartError, TranscodeParams};
use crate::config::StorageConfig;
use crate::metrics;
use crate::tasks::{JobKind, TaskRegistry};
use crate::transcode::{
    EncoderPreset, TranscodeConfig, TranscodeJob, TranscodeRunner, Transcoder, VideoCodec,
};
use crate::transfer::{PollPolicy, TransferEngine, TransferRunner};

/// Accepts job-start requests, enforces the one-job-per-kind policy and
/// hands accepted jobs off to concurrently executing runners.
///
/// `start_*` calls return as soon as the job is registered in
/// `Starting`; they never block on engine or subprocess work. Runner
/// join handles are retained per kind -- there is no cancel API, but
/// the handles are the seam one would hang it on.
pub struct JobSupervisor {
    registry: Arc<TaskRegistry>,
    engine: Arc<dyn TransferEngine>,
    transcoder: Arc<dyn Transcoder>,
    storage: StorageConfig,
    transfer_poll: PollPolicy,
    transcode_config: TranscodeConfig,
    handles: Mutex<HashMap<JobKind, JoinHandle<()>>>,
}

impl JobSupervisor {
    pub fn new(
        registry: Arc<TaskRegistry>,
        engine: Arc<dyn TransferEngine>,
        transcoder: Arc<dyn Transcoder>,
        storage: StorageConfig,
        transfer_poll: PollPolicy,
        transcode_config: TranscodeConfig,
    ) -> Self {
        Self {
            registry,
            engine,
            transcoder,
            storage,
            transfer_poll,
            transcode_config,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a magnet acquisition.
    ///
    /// Rejects synchronously on validation failure or when a transfer
    /// is already in flight. On acceptance the transfer slot reads
    /// `Starting` before this returns.
    pub async fn start_transfer(&self, magnet_uri: &str) -> Result<(), StartError> {
        let uri = magnet_uri.trim();
        if uri.is_empty() {
            return Err(StartError::validation("magnet_link is required"));
        }
        if !uri.starts_with("magnet:") {
            return Err(StartError::validation("magnet_link must be a magnet URI"));
        }

        self.registry
            .try_start(JobKind::Transfer)
            .await
            .map_err(|_| StartError::Conflict(JobKind::Transfer))?;

        info!(engine = self.engine.name(), "Transfer accepted");
        metrics::TRANSFERS_STARTED.inc();

        let runner = TransferRunner::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.engine),
            self.transfer_poll.clone(),
        );
        let uri = uri.to_string();
        let handle = tokio::spawn(async move { runner.run(uri).await });
        self.handles.lock().await.insert(JobKind::Transfer, handle);

        Ok(())
    }

    /// Starts a conversion of a previously downloaded file.
    ///
    /// Validates every parameter and the input path containment before
    /// touching the registry; nothing is spawned on rejection.
    pub async fn start_transcode(&self, params: TranscodeParams) -> Result<(), StartError> {
        let preset = EncoderPreset::parse(&params.preset)
            .ok_or_else(|| StartError::validation(format!("unknown preset: {}", params.preset)))?;
        let codec = VideoCodec::parse(&params.encoder).ok_or_else(|| {
            StartError::validation(format!("unknown encoder: {}", params.encoder))
        })?;
        if params.crf > 51 {
            return Err(StartError::validation("crf must be between 0 and 51"));
        }

        let input_path = resolve_input_path(&self.storage.download_dir, &params.filename)?;
        match tokio::fs::metadata(&input_path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(StartError::validation(format!(
                    "input file not found: {}",
                    params.filename
                )))
            }
        }

        let stem = input_path
            .file_stem()
            .ok_or_else(|| StartError::validation("filename has no stem"))?;
        let output_filename = format!("{}.mp4", stem.to_string_lossy());
        let output_path = self.storage.convert_dir.join(&output_filename);

        self.registry
            .try_start(JobKind::Transcode)
            .await
            .map_err(|_| StartError::Conflict(JobKind::Transcode))?;

        debug!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Conversion accepted"
        );
        metrics::TRANSCODES_STARTED.inc();

        let job = TranscodeJob {
            input_path,
            output_path,
            output_filename,
            codec,
            preset,
            crf: params.crf,
            audio_bitrate_kbps: self.transcode_config.audio_bitrate_kbps,
        };

        let runner = TranscodeRunner::new(Arc::clone(&self.registry), Arc::clone(&self.transcoder));
        let handle = tokio::spawn(async move { runner.run(job).await });
        self.handles.lock().await.insert(JobKind::Transcode, handle);

        Ok(())
    }
}

/// Resolves a request-supplied relative filename against the managed
/// download directory, rejecting anything that would escape it.
///
/// The file-listing endpoint exposes relative names, so this is the
/// traversal barrier: absolute paths and parent/root components are
/// refused before any filesystem access.
fn resolve_input_path(download_dir: &Path, filename: &str) -> Result<PathBuf, StartError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(StartError::validation("filename is required"));
    }

    let relative = Path::new(trimmed);
    if relative.is_absolute() {
        return Err(StartError::validation("filename must be relative"));
    }
    for component in relative.components() {
        match component {
            Component::Normal(_) => {}
            _ => {
                return Err(StartError::validation(
                    "filename must not contain parent or root segments",
                ))
            }
        }
    }

    Ok(download_dir.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_filename() {
        let path = resolve_input_path(Path::new("/data/downloads"), "movie.mkv").unwrap();
        assert_eq!(path, Path::new("/data/downloads/movie.mkv"));
    }

    #[test]
    fn test_resolve_nested_filename() {
        let path = resolve_input_path(Path::new("/data/downloads"), "show/s01e01.mkv").unwrap();
        assert_eq!(path, Path::new("/data/downloads/show/s01e01.mkv"));
    }

    #[test]
    fn test_reject_parent_traversal() {
        assert!(resolve_input_path(Path::new("/data/downloads"), "../../etc/passwd").is_err());
        assert!(resolve_input_path(Path::new("/data/downloads"), "a/../../b.mkv").is_err());
    }

    #[test]
    fn test_reject_absolute_path() {
        assert!(resolve_input_path(Path::new("/data/downloads"), "/etc/passwd").is_err());
    }

    #[test]
    fn test_reject_empty() {
        assert!(resolve_input_path(Path::new("/data/downloads"), "  ").is_err());
    }
}
