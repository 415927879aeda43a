//! Error types for the transcode module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the encoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// FFmpeg binary not found.
    #[error("ffmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// The encoder exited with a non-zero status.
    #[error("encoder exited with code {code:?}: {stderr_tail}")]
    EncoderFailed {
        code: Option<i32>,
        stderr_tail: String,
    },

    /// The encoder exceeded the configured timeout and was killed.
    #[error("conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The encoder reported success but produced no output file.
    #[error("output file not created: {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error while spawning or communicating with the encoder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates an encoder-failed error, trimming an empty stderr tail
    /// to a placeholder so `error_detail` is never blank.
    pub fn encoder_failed(code: Option<i32>, stderr_tail: String) -> Self {
        let stderr_tail = if stderr_tail.trim().is_empty() {
            "no diagnostic output captured".to_string()
        } else {
            stderr_tail
        };
        Self::EncoderFailed { code, stderr_tail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_failed_never_blank() {
        let err = TranscodeError::encoder_failed(Some(1), "  ".to_string());
        match err {
            TranscodeError::EncoderFailed { stderr_tail, .. } => {
                assert!(!stderr_tail.trim().is_empty());
            }
            _ => panic!("expected EncoderFailed"),
        }
    }

    #[test]
    fn test_display() {
        let err = TranscodeError::Timeout { timeout_secs: 10 };
        assert_eq!(err.to_string(), "conversion timed out after 10 seconds");
    }
}
