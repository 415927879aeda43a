//! Mock transcoder for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

use crate::transcode::{
    TranscodeError, TranscodeJob, TranscodeOutcome, TranscodeProgress, Transcoder,
};

/// Controllable implementation of the [`Transcoder`] trait.
///
/// Sends a scripted progress sequence, then either fails with an
/// injected error or succeeds, writing a small output file so the
/// produced artifact really exists on disk.
pub struct MockTranscoder {
    jobs: Arc<RwLock<Vec<TranscodeJob>>>,
    progress_script: Arc<RwLock<Vec<TranscodeProgress>>>,
    fail_with: Arc<RwLock<Option<TranscodeError>>>,
    write_output: bool,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            progress_script: Arc::new(RwLock::new(Vec::new())),
            fail_with: Arc::new(RwLock::new(None)),
            write_output: true,
        }
    }

    /// Disables writing the stub output file on success.
    pub fn without_output_file(mut self) -> Self {
        self.write_output = false;
        self
    }

    /// Appends a progress update to the script.
    pub async fn push_progress(&self, percent: f64, eta_secs: Option<u64>) {
        self.progress_script.write().await.push(TranscodeProgress {
            percent,
            out_time_secs: percent * 0.6,
            eta_secs,
            speed: Some(1.0),
        });
    }

    /// Makes the next transcode call fail after the scripted progress.
    pub async fn set_failure(&self, error: TranscodeError) {
        *self.fail_with.write().await = Some(error);
    }

    /// Jobs received, in call order.
    pub async fn received_jobs(&self) -> Vec<TranscodeJob> {
        self.jobs.read().await.clone()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        self.jobs.write().await.push(job.clone());

        for progress in self.progress_script.read().await.iter() {
            // Blocking send so no scripted update is dropped.
            let _ = progress_tx.send(progress.clone()).await;
        }

        if let Some(err) = self.fail_with.write().await.take() {
            return Err(err);
        }

        let contents = b"converted";
        if self.write_output {
            if let Some(parent) = job.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&job.output_path, contents).await?;
        }

        Ok(TranscodeOutcome {
            output_path: job.output_path.clone(),
            output_size_bytes: contents.len() as u64,
            duration_ms: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcode::{EncoderPreset, VideoCodec};
    use std::path::PathBuf;

    fn job(dir: &std::path::Path) -> TranscodeJob {
        TranscodeJob {
            input_path: dir.join("in.mkv"),
            output_path: dir.join("out.mp4"),
            output_filename: "out.mp4".to_string(),
            codec: VideoCodec::H264,
            preset: EncoderPreset::Medium,
            crf: 23,
            audio_bitrate_kbps: 128,
        }
    }

    #[tokio::test]
    async fn test_success_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = MockTranscoder::new();
        let (tx, mut rx) = mpsc::channel(16);

        transcoder.push_progress(50.0, Some(30)).await;

        let outcome = transcoder.transcode(&job(dir.path()), tx).await.unwrap();
        assert!(outcome.output_path.exists());
        assert_eq!(outcome.output_size_bytes, 9);

        let progress = rx.recv().await.unwrap();
        assert_eq!(progress.percent, 50.0);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = MockTranscoder::new();
        transcoder
            .set_failure(TranscodeError::encoder_failed(Some(1), "bad input".into()))
            .await;

        let (tx, _rx) = mpsc::channel(16);
        assert!(transcoder.transcode(&job(dir.path()), tx).await.is_err());

        let (tx, _rx) = mpsc::channel(16);
        assert!(transcoder.transcode(&job(dir.path()), tx).await.is_ok());
    }
}
