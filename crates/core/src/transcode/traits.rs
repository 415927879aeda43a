//! Trait definition for the transcode seam.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::TranscodeError;
use super::types::{TranscodeJob, TranscodeOutcome, TranscodeProgress};

/// An encoder backend that can run one conversion job.
///
/// Progress updates are sent on the channel while the encoder runs; if
/// the receiver is dropped the conversion continues without reporting.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Runs the job to completion, reporting progress opportunistically.
    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
    ) -> Result<TranscodeOutcome, TranscodeError>;
}
