//! Job control and status handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Form, Json};
use serde::{Deserialize, Serialize};

use mediaforge_core::{JobKind, JobState, StartError, TranscodeParams};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMagnetForm {
    #[serde(default)]
    pub magnet_link: String,
}

#[derive(Debug, Deserialize)]
pub struct StartConvertForm {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub preset: String,
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_encoder")]
    pub encoder: String,
}

fn default_crf() -> u8 {
    23
}

fn default_encoder() -> String {
    "libx264".to_string()
}

/// Maps a synchronous start rejection to an HTTP response.
///
/// Validation failures are 400; a job already in flight is 409 so
/// callers can distinguish "fix the request" from "retry later".
fn rejection(err: StartError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        StartError::Validation(_) => StatusCode::BAD_REQUEST,
        StartError::Conflict(_) => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /status
///
/// The full job-state mapping, one entry per kind. Reads a consistent
/// point-in-time copy; never blocks on runner activity.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<BTreeMap<JobKind, JobState>> {
    Json(state.registry().snapshot_all().await)
}

/// POST /add_magnet
///
/// Starts a magnet acquisition in the background. Returns as soon as
/// the job is registered; progress is discovered by polling /status.
pub async fn add_magnet(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AddMagnetForm>,
) -> Result<Json<SuccessResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.supervisor().start_transfer(&form.magnet_link).await {
        Ok(()) => Ok(Json(SuccessResponse {
            message: "Download started".to_string(),
        })),
        Err(e) => Err(rejection(e)),
    }
}

/// POST /start_convert
///
/// Starts a conversion of a downloaded file in the background.
pub async fn start_convert(
    State(state): State<Arc<AppState>>,
    Form(form): Form<StartConvertForm>,
) -> Result<Json<SuccessResponse>, (StatusCode, Json<ErrorResponse>)> {
    if form.preset.trim().is_empty() {
        return Err(rejection(StartError::validation("preset is required")));
    }

    let params = TranscodeParams {
        filename: form.filename,
        preset: form.preset,
        crf: form.crf,
        encoder: form.encoder,
    };

    match state.supervisor().start_transcode(params).await {
        Ok(()) => Ok(Json(SuccessResponse {
            message: "Conversion started".to_string(),
        })),
        Err(e) => Err(rejection(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_form_defaults() {
        let form: StartConvertForm =
            serde_urlencoded::from_str("filename=movie.mkv&preset=medium").unwrap();
        assert_eq!(form.crf, 23);
        assert_eq!(form.encoder, "libx264");
    }

    #[test]
    fn test_convert_form_overrides() {
        let form: StartConvertForm =
            serde_urlencoded::from_str("filename=a.mkv&preset=slow&crf=18&encoder=h265").unwrap();
        assert_eq!(form.crf, 18);
        assert_eq!(form.encoder, "h265");
    }

    #[test]
    fn test_magnet_form_missing_field_defaults_empty() {
        let form: AddMagnetForm = serde_urlencoded::from_str("").unwrap();
        assert!(form.magnet_link.is_empty());
    }
}
