//! Poll loop that drives one acquisition to completion.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::types::{PollPolicy, TransferEngine};
use crate::metrics;
use crate::tasks::{round_percent, JobKind, JobState, TaskRegistry};

/// Drives a single transfer job, publishing snapshots to the registry.
///
/// The runner owns the job from spawn until a terminal phase; nothing
/// else writes the transfer slot while it runs.
pub struct TransferRunner {
    registry: Arc<TaskRegistry>,
    engine: Arc<dyn TransferEngine>,
    policy: PollPolicy,
}

impl TransferRunner {
    pub fn new(
        registry: Arc<TaskRegistry>,
        engine: Arc<dyn TransferEngine>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            registry,
            engine,
            policy,
        }
    }

    /// Runs the job to completion or failure. Never returns an error --
    /// every outcome after acceptance is reported through the registry.
    pub async fn run(self, magnet_uri: String) {
        let started = Instant::now();

        // The supervisor has already published Starting; metadata
        // resolution happens inside begin() for the embedded engine.
        let transfer_id = match self.engine.begin(&magnet_uri).await {
            Ok(id) => id,
            Err(e) => {
                warn!(engine = self.engine.name(), error = %e, "Transfer could not be started");
                self.registry
                    .set(JobState::failed(JobKind::Transfer, e.to_string()))
                    .await;
                metrics::TRANSFERS_TOTAL.with_label_values(&["failed"]).inc();
                return;
            }
        };

        info!(transfer_id = %transfer_id, "Transfer started, entering poll loop");

        let mut consecutive_failures: u32 = 0;
        let mut last_error = String::new();
        let mut last_percent = 0.0_f64;
        let mut display_name: Option<String> = None;
        let mut saw_metadata = false;

        loop {
            tokio::time::sleep(self.policy.interval).await;

            let snapshot = match self.engine.poll(&transfer_id).await {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    snapshot
                }
                Err(e) => {
                    // A transient fault is tolerated and retried on the
                    // next tick; a run of them fails the job.
                    consecutive_failures += 1;
                    last_error = e.to_string();
                    warn!(
                        transfer_id = %transfer_id,
                        failures = consecutive_failures,
                        error = %e,
                        "Transfer poll failed"
                    );
                    if consecutive_failures >= self.policy.max_consecutive_failures {
                        let mut state = JobState::failed(JobKind::Transfer, last_error);
                        state.display_name = display_name;
                        self.registry.set(state).await;
                        metrics::TRANSFERS_TOTAL.with_label_values(&["failed"]).inc();
                        return;
                    }
                    continue;
                }
            };

            if snapshot.name.is_some() {
                display_name = snapshot.name.clone();
            }

            // Phase transitions are monotonic within the run: once the
            // job is Running, a metadata-less snapshot cannot send it
            // back to Starting.
            if !snapshot.has_metadata && !saw_metadata {
                let mut state = JobState::starting(JobKind::Transfer);
                state.display_name = display_name.clone();
                self.registry.set(state).await;
                continue;
            }
            saw_metadata = true;

            if snapshot.finished {
                let mut state = JobState::complete(JobKind::Transfer);
                state.display_name = display_name.clone();
                self.registry.set(state).await;
                info!(
                    transfer_id = %transfer_id,
                    name = display_name.as_deref().unwrap_or(""),
                    "Transfer complete"
                );
                metrics::TRANSFERS_TOTAL
                    .with_label_values(&["complete"])
                    .inc();
                metrics::TRANSFER_DURATION.observe(started.elapsed().as_secs_f64());
                return;
            }

            // Progress is clamped non-decreasing within the run; the
            // engine's byte counts can wobble during rechecks.
            let percent = round_percent((snapshot.progress * 100.0).min(100.0));
            last_percent = last_percent.max(percent);

            debug!(
                transfer_id = %transfer_id,
                percent = last_percent,
                rate_bps = snapshot.download_rate_bps,
                "Transfer progress"
            );

            let mut state = JobState::running(JobKind::Transfer, last_percent)
                .with_download_rate(snapshot.download_rate_bps);
            state.display_name = display_name.clone();
            self.registry.set(state).await;
        }
    }
}
