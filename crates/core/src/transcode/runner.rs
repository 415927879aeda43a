//! Supervises one encoder run and publishes its status.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::traits::Transcoder;
use super::types::TranscodeJob;
use crate::metrics;
use crate::tasks::{round_percent, JobKind, JobState, TaskRegistry};

/// Drives a single transcode job, publishing snapshots to the registry.
pub struct TranscodeRunner {
    registry: Arc<TaskRegistry>,
    transcoder: Arc<dyn Transcoder>,
}

impl TranscodeRunner {
    pub fn new(registry: Arc<TaskRegistry>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            registry,
            transcoder,
        }
    }

    /// Runs the job to completion or failure. All outcomes after
    /// acceptance are reported through the registry only; encoder
    /// failures are final and never retried here.
    pub async fn run(self, job: TranscodeJob) {
        let started = Instant::now();
        let display_name = job
            .input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        let output_filename = job.output_filename.clone();

        let mut running = JobState::running(JobKind::Transcode, 0.0);
        running.display_name = display_name.clone();
        self.registry.set(running).await;

        let (progress_tx, mut progress_rx) = mpsc::channel(16);

        let transcoder = Arc::clone(&self.transcoder);
        let handle = tokio::spawn(async move { transcoder.transcode(&job, progress_tx).await });

        // Drain progress until the encoder drops its sender.
        let mut last_percent = 0.0_f64;
        while let Some(progress) = progress_rx.recv().await {
            last_percent = last_percent.max(round_percent(progress.percent.min(100.0)));

            let mut state = JobState::running(JobKind::Transcode, last_percent);
            state.display_name = display_name.clone();
            state.eta_secs = progress.eta_secs;
            self.registry.set(state).await;
        }

        match handle.await {
            Ok(Ok(outcome)) => {
                let mut state =
                    JobState::complete(JobKind::Transcode).with_result(output_filename.clone());
                state.display_name = display_name;
                self.registry.set(state).await;
                info!(
                    output = %outcome.output_path.display(),
                    size_bytes = outcome.output_size_bytes,
                    duration_ms = outcome.duration_ms,
                    "Conversion complete"
                );
                metrics::TRANSCODES_TOTAL
                    .with_label_values(&["complete"])
                    .inc();
                metrics::TRANSCODE_DURATION.observe(started.elapsed().as_secs_f64());
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Conversion failed");
                let mut state = JobState::failed(JobKind::Transcode, e.to_string());
                state.display_name = display_name;
                self.registry.set(state).await;
                metrics::TRANSCODES_TOTAL
                    .with_label_values(&["failed"])
                    .inc();
            }
            Err(e) => {
                // The encoder task panicked or was aborted.
                warn!(error = %e, "Conversion task died");
                let mut state = JobState::failed(
                    JobKind::Transcode,
                    format!("conversion task died: {}", e),
                );
                state.display_name = display_name;
                self.registry.set(state).await;
                metrics::TRANSCODES_TOTAL
                    .with_label_values(&["failed"])
                    .inc();
            }
        }
    }
}
