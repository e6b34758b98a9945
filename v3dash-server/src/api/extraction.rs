//! Pass-through routes to the extraction backend
//!
//! POST /api/extract-text-from-pdf, /api/process-text-for-v3,
//! /api/extract-placeholders, /api/analyze-template-advanced and the raw
//! /external-api/*path relay.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::api::{json_body, read_single_file};
use crate::error::{ApiError, ApiResult};
use crate::services::backend_client::{PdfTextResponse, PlaceholderReport, V3ProcessingResponse};
use crate::AppState;

/// POST /api/process-text-for-v3 request
#[derive(Debug, Deserialize)]
pub struct ProcessTextRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub current_data: Option<HashMap<String, String>>,
}

/// POST /api/extract-text-from-pdf
pub async fn extract_text_from_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PdfTextResponse>> {
    let file = read_single_file(multipart).await?;
    tracing::debug!(file_name = %file.file_name, size = file.size(), "PDF received");

    let response = state.backend.extract_pdf_text(&file).await?;
    Ok(Json(response))
}

/// POST /api/process-text-for-v3
pub async fn process_text_for_v3(
    State(state): State<AppState>,
    body: Result<Json<ProcessTextRequest>, JsonRejection>,
) -> ApiResult<Json<V3ProcessingResponse>> {
    let request = json_body(body)?;
    let text = request
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Aucun texte fourni".to_string()))?;

    let current_data = request.current_data.unwrap_or_default();
    let response = state
        .backend
        .process_text_for_v3(&text, &current_data)
        .await?;
    Ok(Json(response))
}

/// POST /api/extract-placeholders
pub async fn extract_placeholders(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PlaceholderReport>> {
    let file = read_single_file(multipart).await?;
    let report = state.backend.extract_placeholders(&file).await?;
    Ok(Json(report))
}

/// POST /api/analyze-template-advanced
pub async fn analyze_template_advanced(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PlaceholderReport>> {
    let file = read_single_file(multipart).await?;
    let report = state.backend.analyze_template_advanced(&file).await?;
    Ok(Json(report))
}

/// ANY /external-api/*path
///
/// Relays method, query, content type and body; the backend's status and body
/// come back unchanged.
pub async fn forward_to_backend(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let forwarded = state
        .backend
        .forward(method.as_str(), &path, query.as_deref(), content_type, body.to_vec())
        .await?;

    let status = StatusCode::from_u16(forwarded.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, forwarded.body).into_response();
    if let Some(content_type) = forwarded
        .content_type
        .and_then(|ct| header::HeaderValue::from_str(&ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }

    Ok(response)
}

/// Build extraction proxy routes
pub fn extraction_routes() -> Router<AppState> {
    Router::new()
        .route("/api/extract-text-from-pdf", post(extract_text_from_pdf))
        .route("/api/process-text-for-v3", post(process_text_for_v3))
        .route("/api/extract-placeholders", post(extract_placeholders))
        .route("/api/analyze-template-advanced", post(analyze_template_advanced))
        .route("/external-api/*path", any(forward_to_backend))
}
