//! POST /api/upload: run the upload orchestrator for one drop event

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use v3dash_common::presentation::Notification;
use v3dash_common::AcceptMode;

use crate::api::read_file_parts;
use crate::error::ApiResult;
use crate::services::upload_orchestrator::UploadOrchestrator;
use crate::AppState;

/// Query string of POST /api/upload
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// `pdf`, `docx` or `both`; the configured default when absent
    pub accept: Option<String>,
}

/// POST /api/upload?accept=pdf|docx|both
///
/// Every `file` part counts as dropped; only the first acceptable one is processed.
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let accept = match query.accept.as_deref() {
        Some(raw) => raw.parse::<AcceptMode>()?,
        None => state.config.accept_mode,
    };
    let files = read_file_parts(multipart).await?;

    tracing::info!(files = files.len(), accept = %accept, "Upload received");

    let mut orchestrator = UploadOrchestrator::new(&state.db, &state.backend);
    let response = match orchestrator.process(files, accept).await {
        Ok(report) => {
            let notification = Notification::success(report.message.clone());
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "data": report,
                    "notification": notification,
                })),
            )
                .into_response()
        }
        Err(failure) => {
            let status = StatusCode::from_u16(failure.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let notification = Notification::error(failure.message.clone());
            (
                status,
                Json(json!({
                    "success": false,
                    "error": failure.message,
                    "failedAt": failure.failed_at,
                    "retainedFiles": failure.retained_files,
                    "notification": notification,
                })),
            )
                .into_response()
        }
    };

    Ok(response)
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/api/upload", post(upload))
}
