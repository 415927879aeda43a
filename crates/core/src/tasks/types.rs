//! Job state types shared between runners and the status API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two kinds of background job the service runs.
///
/// Wire names are `transfer` and `convert` -- the keys clients poll
/// under in `/status` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Magnet acquisition via the embedded torrent engine.
    Transfer,
    /// ffmpeg conversion of a downloaded file.
    #[serde(rename = "convert")]
    Transcode,
}

impl JobKind {
    /// Returns the wire name used as the status map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Transfer => "transfer",
            JobKind::Transcode => "convert",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage of a job slot.
///
/// Within one run the phase only moves forward:
/// Idle -> Starting -> Running -> Complete | Failed. A new run may only
/// begin from Idle, Complete or Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPhase {
    Idle,
    Starting,
    Running,
    Complete,
    Failed,
}

impl JobPhase {
    /// Whether a job in this phase blocks a new run of the same kind.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, JobPhase::Starting | JobPhase::Running)
    }

    /// Whether this phase ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Complete | JobPhase::Failed)
    }
}

/// Observable status of one job slot.
///
/// Published as a whole record; readers never see a partially updated
/// state. `progress_percent` is only meaningful while Running or
/// Complete, and Complete implies 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub kind: JobKind,
    pub phase: JobPhase,
    /// Torrent name or source filename, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Completion in [0, 100], rounded to two decimals.
    pub progress_percent: f64,
    /// Instantaneous download rate (transfer jobs only). Advisory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_rate_bps: Option<u64>,
    /// Estimated seconds remaining (transcode jobs only). Advisory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
    /// Output filename, set only on Complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_locator: Option<String>,
    /// Diagnostic text, set only on Failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// When this snapshot was published.
    pub updated_at: DateTime<Utc>,
}

impl JobState {
    fn base(kind: JobKind, phase: JobPhase) -> Self {
        Self {
            kind,
            phase,
            display_name: None,
            progress_percent: 0.0,
            download_rate_bps: None,
            eta_secs: None,
            result_locator: None,
            error_detail: None,
            updated_at: Utc::now(),
        }
    }

    /// The slot state at process start and between runs.
    pub fn idle(kind: JobKind) -> Self {
        Self::base(kind, JobPhase::Idle)
    }

    /// A freshly accepted job, before the runner has done any work.
    pub fn starting(kind: JobKind) -> Self {
        Self::base(kind, JobPhase::Starting)
    }

    /// An in-progress job at the given percentage.
    pub fn running(kind: JobKind, progress_percent: f64) -> Self {
        Self {
            progress_percent,
            ..Self::base(kind, JobPhase::Running)
        }
    }

    /// A successfully finished job. Progress is pinned to 100.
    pub fn complete(kind: JobKind) -> Self {
        Self {
            progress_percent: 100.0,
            ..Self::base(kind, JobPhase::Complete)
        }
    }

    /// A terminally failed job with diagnostic text.
    pub fn failed(kind: JobKind, error: impl Into<String>) -> Self {
        Self {
            error_detail: Some(error.into()),
            ..Self::base(kind, JobPhase::Failed)
        }
    }

    /// Sets the human-readable name of the item being processed.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the advisory download rate.
    pub fn with_download_rate(mut self, bps: u64) -> Self {
        self.download_rate_bps = Some(bps);
        self
    }

    /// Sets the advisory ETA.
    pub fn with_eta(mut self, secs: u64) -> Self {
        self.eta_secs = Some(secs);
        self
    }

    /// Sets the produced artifact's filename.
    pub fn with_result(mut self, locator: impl Into<String>) -> Self {
        self.result_locator = Some(locator.into());
        self
    }
}

/// Rounds a percentage to two decimal places.
pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(JobKind::Transfer.as_str(), "transfer");
        assert_eq!(JobKind::Transcode.as_str(), "convert");
        assert_eq!(
            serde_json::to_string(&JobKind::Transcode).unwrap(),
            "\"convert\""
        );
    }

    #[test]
    fn test_phase_serializes_as_variant_name() {
        assert_eq!(
            serde_json::to_string(&JobPhase::Starting).unwrap(),
            "\"Starting\""
        );
        assert_eq!(
            serde_json::to_string(&JobPhase::Complete).unwrap(),
            "\"Complete\""
        );
    }

    #[test]
    fn test_phase_predicates() {
        assert!(JobPhase::Starting.is_in_flight());
        assert!(JobPhase::Running.is_in_flight());
        assert!(!JobPhase::Idle.is_in_flight());
        assert!(JobPhase::Complete.is_terminal());
        assert!(JobPhase::Failed.is_terminal());
        assert!(!JobPhase::Running.is_terminal());
    }

    #[test]
    fn test_complete_pins_progress() {
        let state = JobState::complete(JobKind::Transfer);
        assert_eq!(state.phase, JobPhase::Complete);
        assert_eq!(state.progress_percent, 100.0);
    }

    #[test]
    fn test_failed_carries_detail() {
        let state = JobState::failed(JobKind::Transcode, "boom");
        assert_eq!(state.phase, JobPhase::Failed);
        assert_eq!(state.error_detail.as_deref(), Some("boom"));
        assert!(state.result_locator.is_none());
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let json = serde_json::to_value(JobState::idle(JobKind::Transfer)).unwrap();
        assert!(json.get("display_name").is_none());
        assert!(json.get("result_locator").is_none());
        assert!(json.get("error_detail").is_none());
        assert_eq!(json["phase"], "Idle");
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(33.333_333), 33.33);
        assert_eq!(round_percent(66.666_666), 66.67);
        assert_eq!(round_percent(100.0), 100.0);
    }
}
