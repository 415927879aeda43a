//! FFmpeg-based transcoder implementation.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::TranscodeConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{TranscodeJob, TranscodeOutcome, TranscodeProgress};

/// Number of recent diagnostic lines kept for failure reporting.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscodeConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscodeConfig::default())
    }

    /// Checks that the ffmpeg and ffprobe binaries are invocable.
    pub async fn validate(&self) -> Result<(), TranscodeError> {
        for path in [&self.config.ffmpeg_path, &self.config.ffprobe_path] {
            let result = Command::new(path).arg("-version").output().await;
            if let Err(e) = result {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(TranscodeError::FfmpegNotFound { path: path.clone() });
                }
                return Err(TranscodeError::Io(e));
            }
        }
        Ok(())
    }

    /// Probes the input duration for progress calculation.
    ///
    /// Returns None when the probe fails; the conversion still runs, it
    /// just cannot report duration-based percent.
    async fn probe_duration_secs(&self, path: &Path) -> Option<f64> {
        let output = Command::new(&self.config.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        Self::parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parses ffprobe JSON output into the container duration.
    fn parse_probe_duration(output: &str) -> Option<f64> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).ok()?;
        probe.format.duration.as_ref()?.parse::<f64>().ok()
    }

    /// Whether a stderr line is a `-progress pipe:2` counter rather
    /// than diagnostic output.
    fn is_progress_line(line: &str) -> bool {
        static KEYS: [&str; 11] = [
            "frame=",
            "fps=",
            "stream_",
            "bitrate=",
            "total_size=",
            "out_time_us=",
            "out_time_ms=",
            "out_time=",
            "dup_frames=",
            "drop_frames=",
            "speed=",
        ];
        KEYS.iter().any(|k| line.starts_with(k)) || line.starts_with("progress=")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let start = Instant::now();

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Input duration for percent calculation; best-effort.
        let duration_secs = self.probe_duration_secs(&job.input_path).await;

        let args = job.to_ffmpeg_args(&self.config.ffmpeg_log_level);
        debug!(input = %job.input_path.display(), output = %job.output_path.display(), "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr should be captured");
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();
        let speed_regex = Regex::new(r"speed=(\d+\.?\d*)x").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut current_time = 0.0_f64;
            let mut current_speed: Option<f64> = None;
            let mut last_progress_send = Instant::now();
            let progress_interval = Duration::from_millis(500);

            while let Ok(Some(line)) = reader.next_line().await {
                if !Self::is_progress_line(&line) && !line.trim().is_empty() {
                    if stderr_tail.len() == STDERR_TAIL_LINES {
                        stderr_tail.pop_front();
                    }
                    stderr_tail.push_back(line.clone());
                    continue;
                }

                if let Some(ref re) = time_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(ms_str) = caps.get(1) {
                            if let Ok(ms) = ms_str.as_str().parse::<f64>() {
                                // out_time_ms is microseconds despite the name
                                current_time = ms / 1_000_000.0;
                            }
                        }
                    }
                }

                if let Some(ref re) = speed_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(speed_str) = caps.get(1) {
                            current_speed = speed_str.as_str().parse::<f64>().ok();
                        }
                    }
                }

                if last_progress_send.elapsed() >= progress_interval {
                    let (percent, eta_secs) = match duration_secs {
                        Some(dur) if dur > 0.0 => {
                            let percent = (current_time / dur * 100.0).min(100.0);
                            let eta = current_speed.filter(|s| *s > 0.0).map(|s| {
                                ((dur - current_time).max(0.0) / s).round() as u64
                            });
                            (percent, eta)
                        }
                        // No duration: coarse placeholder until completion.
                        _ => (0.0, None),
                    };

                    // Non-blocking send
                    let _ = progress_tx.try_send(TranscodeProgress {
                        percent,
                        out_time_secs: current_time,
                        eta_secs,
                        speed: current_speed,
                    });
                    last_progress_send = Instant::now();
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, VecDeque<String>), std::io::Error>((
                status,
                stderr_tail,
            ))
        })
        .await;

        match result {
            Ok(Ok((status, stderr_tail))) => {
                if !status.success() {
                    let tail: Vec<String> = stderr_tail.into_iter().collect();
                    return Err(TranscodeError::encoder_failed(
                        status.code(),
                        tail.join("\n"),
                    ));
                }
            }
            Ok(Err(e)) => return Err(TranscodeError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| TranscodeError::OutputMissing {
                path: job.output_path.clone(),
            })?;

        Ok(TranscodeOutcome {
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
