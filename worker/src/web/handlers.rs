//! Job endpoint handlers.
//!
//! The processing endpoint verifies the signature over the exact raw bytes
//! as received, before the body is parsed. Verifying a re-serialized form
//! of the parsed request would not be equivalent: serialization is not
//! guaranteed to reproduce the bytes the sender signed.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::PipelineError;
use crate::models::JobRequest;
use crate::pipeline::ResumePipeline;
use crate::signature::{verify_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<ResumePipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: ResumePipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Job Processing
// =============================================================================

/// Response body for the processing endpoint.
///
/// Identity fields are present on success; stage and message on processing
/// failure. Authentication failures carry the status alone.
#[derive(Serialize)]
pub struct ProcessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProcessResponse {
    fn bare(status: &'static str) -> Self {
        Self {
            status,
            job_id: None,
            owner_id: None,
            stored_path: None,
            stage: None,
            message: None,
        }
    }
}

/// Authenticate the raw request bytes.
///
/// Runs before any parsing or side effect. Diagnostics never include the
/// secret or the expected signature.
fn authenticate(config: &Config, headers: &HeaderMap, body: &[u8]) -> Result<(), PipelineError> {
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    if verify_signature(
        &config.signing_secret,
        body,
        timestamp,
        signature,
        config.signature_tolerance_seconds,
    ) {
        Ok(())
    } else {
        Err(PipelineError::Authentication)
    }
}

/// Map a pipeline error to its HTTP response.
///
/// Authentication rejections stay generic so the endpoint leaks nothing
/// about which check failed; everything else is stage-tagged.
fn error_response(err: PipelineError, job: Option<&JobRequest>) -> (StatusCode, Json<ProcessResponse>) {
    match err {
        PipelineError::Authentication => (
            StatusCode::UNAUTHORIZED,
            Json(ProcessResponse::bare("unauthorized")),
        ),
        err => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ProcessResponse {
                status: "error",
                job_id: job.map(|j| j.job_id),
                owner_id: job.map(|j| j.owner_id),
                stored_path: err.stored_path().map(str::to_string),
                stage: Some(err.stage()),
                message: Some(err.to_string()),
            }),
        ),
    }
}

/// Job processing endpoint.
///
/// This handler:
/// 1. Verifies the HMAC signature over the raw body
/// 2. Parses the job request
/// 3. Runs the pipeline to a terminal state and reports it
pub async fn process_resume(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if let Err(err) = authenticate(&state.config, &headers, &body) {
        warn!(body_length = body.len(), "job_request_unauthorized");
        return error_response(err, None);
    }

    let job: JobRequest = match serde_json::from_slice(&body) {
        Ok(job) => job,
        Err(e) => {
            warn!(error = %e, "job_request_malformed");
            return (
                StatusCode::BAD_REQUEST,
                Json(ProcessResponse::bare("invalid_request")),
            );
        }
    };

    info!(
        job_id = job.job_id,
        owner_id = job.owner_id,
        mime_type = %job.mime_type,
        declared_size = job.size,
        "job_request_received"
    );

    match state.pipeline.process(&job).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ProcessResponse {
                status: "processed",
                job_id: Some(result.job_id),
                owner_id: Some(result.owner_id),
                stored_path: Some(result.stored_path),
                stage: None,
                message: None,
            }),
        ),
        Err(err) => {
            error!(
                job_id = job.job_id,
                stage = err.stage(),
                retryable = err.is_retryable(),
                error = %err,
                "job_failed"
            );
            error_response(err, Some(&job))
        }
    }
}
