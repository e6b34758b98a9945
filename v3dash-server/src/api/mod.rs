//! HTTP API handlers for v3dash-server
//!
//! Success bodies are `{ "success": true, "data": ... }`; failures go through
//! [`ApiError`](crate::error::ApiError).

pub mod dashboard;
pub mod extraction;
pub mod health;
pub mod ui;
pub mod upload;
pub mod v3;

pub use dashboard::dashboard_routes;
pub use extraction::extraction_routes;
pub use health::health_routes;
pub use ui::ui_routes;
pub use upload::upload_routes;
pub use v3::v3_routes;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::services::backend_client::FilePart;

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in a success envelope
pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

/// Unwrap a JSON body, turning axum's rejection into a 400
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Collect every file part of a multipart body
///
/// Parts named `file` or carrying a file name are kept; other fields are skipped.
pub async fn read_file_parts(
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Vec<FilePart>> {
    let mut multipart = multipart.map_err(|r| ApiError::BadRequest(r.body_text()))?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Formulaire multipart invalide: {}", e)))?
    {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }

        let file_name = field.file_name().unwrap_or("fichier").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Lecture du fichier impossible: {}", e)))?;

        files.push(FilePart {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Ok(files)
}

/// The first file part, or 400 when the form has none
pub async fn read_single_file(
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<FilePart> {
    read_file_parts(multipart)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("Aucun fichier fourni".to_string()))
}
