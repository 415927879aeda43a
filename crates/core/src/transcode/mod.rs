//! Transcode module: ffmpeg conversion behind a trait seam.
//!
//! The supervisor builds a validated [`TranscodeJob`], the
//! [`TranscodeRunner`] supervises one [`Transcoder`] invocation, and
//! [`FfmpegTranscoder`] does the real work against an ffmpeg subprocess
//! with `-progress pipe:2` parsing.

mod config;
mod error;
mod ffmpeg;
mod runner;
mod traits;
mod types;

pub use config::TranscodeConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use runner::TranscodeRunner;
pub use traits::Transcoder;
pub use types::{
    EncoderPreset, TranscodeJob, TranscodeOutcome, TranscodeProgress, VideoCodec,
};
