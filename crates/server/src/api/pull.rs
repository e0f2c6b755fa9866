//! Job intake.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use assetor_core::{DownloadJob, WebhookParams};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "webHookParams", default)]
    pub webhook_params: WebhookParams,
}

#[derive(Debug, Serialize)]
pub struct PullResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>, details: Option<String>) -> ErrorReply {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: message.into(),
            details,
        }),
    )
}

/// POST /pull
///
/// Validates the request, starts the job in the background and answers
/// immediately. The outcome is delivered later through the webhook.
pub async fn pull(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PullRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullResponse>), ErrorReply> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected pull request: {}", rejection.body_text());
        bad_request("Invalid JSON payload", Some(rejection.body_text()))
    })?;

    let job = DownloadJob::new(request.url, request.id, request.webhook_params).map_err(|e| {
        warn!("Rejected pull request: {}", e);
        bad_request(e.to_string(), None)
    })?;

    info!("Accepted download request for ID: {}, url: {}", job.id(), job.url());
    state.service().submit(job);

    Ok((
        StatusCode::ACCEPTED,
        Json(PullResponse {
            message: "Download started successfully".to_string(),
        }),
    ))
}
