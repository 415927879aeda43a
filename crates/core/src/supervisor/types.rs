//! Types for the job supervisor.

use thiserror::Error;

use crate::tasks::JobKind;

/// Synchronous rejection of a start request. Anything that happens
/// after acceptance is reported through the task registry instead.
#[derive(Debug, Error)]
pub enum StartError {
    /// Malformed or missing request parameters, path-escape attempts,
    /// unresolvable input files. The job never starts.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A job of the requested kind is already in flight; the caller
    /// must retry after it reaches a terminal phase.
    #[error("a {0} job is already in flight")]
    Conflict(JobKind),
}

impl StartError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}

/// Raw parameters of a conversion request, as received from the API.
///
/// Validated and turned into a typed `TranscodeJob` by the supervisor.
#[derive(Debug, Clone)]
pub struct TranscodeParams {
    /// Path of the source file, relative to the download directory.
    pub filename: String,
    /// Encoder speed/quality preset name.
    pub preset: String,
    /// Constant Rate Factor.
    pub crf: u8,
    /// Video codec identifier (e.g. "libx264").
    pub encoder: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StartError::validation("magnet_link is required");
        assert_eq!(err.to_string(), "invalid request: magnet_link is required");

        let err = StartError::Conflict(JobKind::Transcode);
        assert_eq!(err.to_string(), "a convert job is already in flight");
    }
}
