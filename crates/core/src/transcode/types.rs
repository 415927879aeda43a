//! Types for the transcode module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Video codec for the output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// H.264 / AVC
    #[default]
    H264,
    /// H.265 / HEVC
    H265,
    /// VP9
    Vp9,
}

impl VideoCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// Parses a request-supplied codec identifier, accepting both the
    /// short name and the ffmpeg encoder name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "h264" | "libx264" | "x264" => Some(Self::H264),
            "h265" | "hevc" | "libx265" | "x265" => Some(Self::H265),
            "vp9" | "libvpx-vp9" => Some(Self::Vp9),
            _ => None,
        }
    }
}

/// The x264/x265 speed/quality preset ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderPreset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
    Placebo,
}

impl EncoderPreset {
    /// Returns the ffmpeg `-preset` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Superfast => "superfast",
            Self::Veryfast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::Veryslow => "veryslow",
            Self::Placebo => "placebo",
        }
    }

    /// Parses a request-supplied preset name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ultrafast" => Some(Self::Ultrafast),
            "superfast" => Some(Self::Superfast),
            "veryfast" => Some(Self::Veryfast),
            "faster" => Some(Self::Faster),
            "fast" => Some(Self::Fast),
            "medium" => Some(Self::Medium),
            "slow" => Some(Self::Slow),
            "slower" => Some(Self::Slower),
            "veryslow" => Some(Self::Veryslow),
            "placebo" => Some(Self::Placebo),
            _ => None,
        }
    }
}

/// A validated encoder invocation.
///
/// Built by the supervisor after path containment and parameter checks;
/// everything here is safe to hand to the process spawn as a discrete
/// argument vector. Output is always an mp4 container with AAC audio.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    /// Absolute input path under the managed download directory.
    pub input_path: PathBuf,
    /// Absolute output path under the managed convert directory.
    pub output_path: PathBuf,
    /// Output filename, reported as the result locator on completion.
    pub output_filename: String,
    pub codec: VideoCodec,
    pub preset: EncoderPreset,
    /// Constant Rate Factor (0-51, lower is better quality).
    pub crf: u8,
    /// AAC audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,
}

impl TranscodeJob {
    /// Builds the ffmpeg argument vector for this job.
    ///
    /// Arguments are passed to the spawn primitive as-is, never through
    /// a shell, so filename content cannot inject options.
    pub fn to_ffmpeg_args(&self, log_level: &str) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            self.input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            self.codec.ffmpeg_codec().to_string(),
            "-preset".to_string(),
            self.preset.as_str().to_string(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.audio_bitrate_kbps),
            "-loglevel".to_string(),
            log_level.to_string(),
            // Progress output for parsing
            "-progress".to_string(),
            "pipe:2".to_string(),
            self.output_path.to_string_lossy().to_string(),
        ]
    }
}

/// Progress update emitted while the encoder runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeProgress {
    /// Percent complete (0.0 - 100.0), derived from the input duration.
    pub percent: f64,
    /// Output time produced so far, in seconds.
    pub out_time_secs: f64,
    /// Estimated seconds remaining, when the encode speed is known.
    pub eta_secs: Option<u64>,
    /// Encode speed relative to realtime (e.g. 1.5 for "1.5x").
    pub speed: Option<f64>,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct TranscodeOutcome {
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_codec_ffmpeg_names() {
        assert_eq!(VideoCodec::H264.ffmpeg_codec(), "libx264");
        assert_eq!(VideoCodec::H265.ffmpeg_codec(), "libx265");
        assert_eq!(VideoCodec::Vp9.ffmpeg_codec(), "libvpx-vp9");
    }

    #[test]
    fn test_codec_parse_aliases() {
        assert_eq!(VideoCodec::parse("libx264"), Some(VideoCodec::H264));
        assert_eq!(VideoCodec::parse("H264"), Some(VideoCodec::H264));
        assert_eq!(VideoCodec::parse("hevc"), Some(VideoCodec::H265));
        assert_eq!(VideoCodec::parse("vp9"), Some(VideoCodec::Vp9));
        assert_eq!(VideoCodec::parse("mpeg2"), None);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(EncoderPreset::parse("medium"), Some(EncoderPreset::Medium));
        assert_eq!(
            EncoderPreset::parse("VERYSLOW"),
            Some(EncoderPreset::Veryslow)
        );
        assert_eq!(EncoderPreset::parse("warp10"), None);
    }

    #[test]
    fn test_ffmpeg_args() {
        let job = TranscodeJob {
            input_path: Path::new("/data/downloads/movie.mkv").to_path_buf(),
            output_path: Path::new("/data/converted/movie.mp4").to_path_buf(),
            output_filename: "movie.mp4".to_string(),
            codec: VideoCodec::H264,
            preset: EncoderPreset::Medium,
            crf: 23,
            audio_bitrate_kbps: 128,
        };

        let args = job.to_ffmpeg_args("warning");
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"medium".to_string()));
        assert!(args.contains(&"23".to_string()));
        assert!(args.contains(&"aac".to_string()));
        assert!(args.contains(&"128k".to_string()));
        assert!(args.contains(&"pipe:2".to_string()));
        // Output path is the final argument.
        assert_eq!(args.last().unwrap(), "/data/converted/movie.mp4");
    }
}
