//! V3 document routes
//!
//! POST /api/v3/create, GET /api/v3/latest, PUT /api/v3/update,
//! POST /api/v3/add-file, GET /api/v3/stats, GET /api/v3/files

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use v3dash_common::models::{FileStatus, NewUploadedFile, UploadedFile, V3Document, V3Stats};
use v3dash_common::V3Record;

use crate::api::{json_body, success, ApiResponse};
use crate::db::{documents, files};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/v3/create request
#[derive(Debug, Default, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub data: Option<HashMap<String, String>>,
}

/// PUT /api/v3/update request
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<HashMap<String, String>>,
    /// When given, the update only applies if the stored version still matches
    #[serde(default)]
    pub version: Option<i64>,
}

/// POST /api/v3/add-file request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFileRequest {
    #[serde(default)]
    pub v3_document_id: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub status: Option<FileStatus>,
}

/// POST /api/v3/create
///
/// An empty body creates an all-empty document.
pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<V3Document>>> {
    let request: CreateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Corps JSON invalide: {}", e)))?
    };

    let initial = request.data.map(V3Record::from_fields).transpose()?;
    let document = documents::create_document(&state.db, initial.as_ref()).await?;

    Ok(success(document))
}

/// GET /api/v3/latest
pub async fn latest(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<V3Document>>> {
    documents::get_latest_document(&state.db)
        .await?
        .map(success)
        .ok_or_else(|| ApiError::NotFound("Aucun document V3 trouvé".to_string()))
}

/// PUT /api/v3/update
pub async fn update(
    State(state): State<AppState>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<V3Document>>> {
    let request = json_body(body)?;
    let (Some(id), Some(data)) = (request.id.filter(|id| !id.is_empty()), request.data) else {
        return Err(ApiError::BadRequest("ID et données requis".to_string()));
    };

    let record = V3Record::from_fields(data)?;
    let document = documents::update_document(&state.db, &id, &record, request.version).await?;

    Ok(success(document))
}

/// POST /api/v3/add-file
pub async fn add_file(
    State(state): State<AppState>,
    body: Result<Json<AddFileRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<UploadedFile>>> {
    let request = json_body(body)?;
    let incomplete = || ApiError::BadRequest("Informations de fichier incomplètes".to_string());

    let document_id = request.v3_document_id.filter(|id| !id.is_empty()).ok_or_else(incomplete)?;
    let meta = NewUploadedFile {
        file_name: request.file_name.ok_or_else(incomplete)?,
        file_type: request.file_type.ok_or_else(incomplete)?,
        file_size: request.file_size.ok_or_else(incomplete)?,
        status: request.status.unwrap_or_default(),
    };

    let file = files::attach_file(&state.db, &document_id, &meta).await?;
    Ok(success(file))
}

/// GET /api/v3/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<V3Stats>>> {
    let stats = documents::compute_stats(&state.db).await?;
    Ok(success(stats))
}

/// GET /api/v3/files
pub async fn list_files(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<UploadedFile>>>> {
    let files = files::list_files(&state.db).await?;
    Ok(success(files))
}

/// Build V3 document routes
pub fn v3_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v3/create", post(create))
        .route("/api/v3/latest", get(latest))
        .route("/api/v3/update", put(update))
        .route("/api/v3/add-file", post(add_file))
        .route("/api/v3/stats", get(stats))
        .route("/api/v3/files", get(list_files))
}
