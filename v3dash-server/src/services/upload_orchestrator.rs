//! Upload orchestration
//!
//! One drop event, one processed file:
//!
//! ```text
//! Idle → Validating → Extracting → Merging → Persisting → Done
//!            ↓            ↓           ↓           ↓
//!          Failed      Failed      Failed      Failed
//! ```
//!
//! PDFs go through text extraction and V3 field processing, and the merged
//! record is committed together with the file record. DOCX files only produce
//! a placeholder report and never touch the document store. Nothing is retried.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use v3dash_common::models::{FileStatus, NewUploadedFile, UploadedFile, V3Document};
use v3dash_common::{AcceptMode, FileKind};

use crate::db::documents;
use crate::error::ApiError;
use crate::services::backend_client::{BackendClient, BackendError, FilePart, PlaceholderReport};

/// Success message for a processed PDF
pub const PDF_SUCCESS_MESSAGE: &str = "PDF traité avec succès";

/// Orchestrator state for the file being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    Idle,
    Validating,
    Extracting,
    Merging,
    Persisting,
    Done,
    Failed,
}

/// Outcome of a successful upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub file_name: String,
    pub kind: FileKind,
    /// Human-readable summary shown in the notification
    pub message: String,
    /// Updated document (PDF path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<V3Document>,
    /// File record attached to the document (PDF path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_file: Option<UploadedFile>,
    /// Placeholder occurrences (DOCX path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholders: Option<PlaceholderReport>,
    /// Backend keys that are not V3 fields and were dropped during the merge
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored_fields: Vec<String>,
    /// Other accepted files from the same drop; listed, never submitted
    pub retained_files: Vec<String>,
}

/// Why an upload stopped, and where
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct UploadFailure {
    pub failed_at: UploadState,
    /// HTTP status to report
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub retained_files: Vec<String>,
}

/// Runs one drop event against the store and the backend
pub struct UploadOrchestrator<'a> {
    db: &'a SqlitePool,
    backend: &'a BackendClient,
    state: UploadState,
    file_name: Option<String>,
    retained_files: Vec<String>,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(db: &'a SqlitePool, backend: &'a BackendClient) -> Self {
        Self {
            db,
            backend,
            state: UploadState::Idle,
            file_name: None,
            retained_files: Vec::new(),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Process the first acceptable file of `files`
    pub async fn process(
        &mut self,
        files: Vec<FilePart>,
        accept: AcceptMode,
    ) -> Result<UploadReport, UploadFailure> {
        self.transition(UploadState::Validating);

        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        let valid = accept.valid_files(&names);
        let Some(&selected) = valid.first() else {
            tracing::info!(dropped = files.len(), accept = %accept, "No acceptable file in drop");
            return Err(self.fail(400, accept.rejection_message()));
        };

        self.retained_files = valid[1..]
            .iter()
            .map(|&idx| files[idx].file_name.clone())
            .collect();

        let mut files = files;
        let file = files.swap_remove(selected);
        self.file_name = Some(file.file_name.clone());

        if file.bytes.is_empty() {
            return Err(self.fail(400, format!("Le fichier {} est vide", file.file_name)));
        }

        // valid_files only returns names with a known extension
        let Some(kind) = FileKind::from_file_name(&file.file_name) else {
            return Err(self.fail(400, accept.rejection_message()));
        };

        tracing::info!(
            file_name = %file.file_name,
            kind = ?kind,
            size = file.size(),
            retained = self.retained_files.len(),
            "File selected for processing"
        );

        match kind {
            FileKind::Pdf => self.process_pdf(file).await,
            FileKind::Docx => self.process_docx(file).await,
        }
    }

    async fn process_pdf(&mut self, file: FilePart) -> Result<UploadReport, UploadFailure> {
        self.transition(UploadState::Extracting);

        let extraction = self
            .backend
            .extract_pdf_text(&file)
            .await
            .map_err(|e| self.fail_backend(e))?;
        let text = match extraction.text {
            Some(text) if extraction.success && !text.is_empty() => text,
            _ => {
                return Err(self.fail(
                    500,
                    extraction
                        .error
                        .unwrap_or_else(|| "Échec de l'extraction du texte".to_string()),
                ))
            }
        };

        self.transition(UploadState::Merging);

        let document = self.current_document().await?;
        let processing = self
            .backend
            .process_text_for_v3(&text, &document.data.to_map())
            .await
            .map_err(|e| self.fail_backend(e))?;
        let fields = match processing.fields() {
            Some(fields) if processing.success => fields,
            _ => {
                return Err(self.fail(
                    500,
                    processing
                        .error
                        .unwrap_or_else(|| "Échec du traitement des données V3".to_string()),
                ))
            }
        };

        let mut merged = document.data.clone();
        let summary = merged.merge_from(&fields);
        if !summary.ignored.is_empty() {
            tracing::warn!(ignored = ?summary.ignored, "Backend returned keys outside the V3 catalog");
        }
        tracing::debug!(applied = summary.applied, "Backend fields merged");

        self.transition(UploadState::Persisting);

        let meta = NewUploadedFile {
            file_name: file.file_name.clone(),
            file_type: file
                .content_type
                .clone()
                .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
                .unwrap_or_else(|| FileKind::Pdf.mime_type().to_string()),
            file_size: file.size() as i64,
            status: FileStatus::Processed,
        };
        let (document, uploaded) =
            documents::commit_merge(self.db, &document.id, Some(document.version), &merged, &meta)
                .await
                .map_err(|e| self.fail_store(e))?;

        self.transition(UploadState::Done);
        tracing::info!(
            document_id = %document.id,
            completion_rate = document.completion_rate,
            "PDF processed"
        );

        Ok(UploadReport {
            file_name: file.file_name,
            kind: FileKind::Pdf,
            message: PDF_SUCCESS_MESSAGE.to_string(),
            document: Some(document),
            uploaded_file: Some(uploaded),
            placeholders: None,
            ignored_fields: summary.ignored,
            retained_files: std::mem::take(&mut self.retained_files),
        })
    }

    async fn process_docx(&mut self, file: FilePart) -> Result<UploadReport, UploadFailure> {
        self.transition(UploadState::Extracting);

        let report = self
            .backend
            .extract_placeholders(&file)
            .await
            .map_err(|e| self.fail_backend(e))?;
        if let Some(error) = report.error.clone() {
            return Err(self.fail(500, error));
        }

        self.transition(UploadState::Done);

        Ok(UploadReport {
            file_name: file.file_name,
            kind: FileKind::Docx,
            message: format!(
                "{} placeholders trouvés, {} uniques.",
                report.total_found, report.unique_count
            ),
            document: None,
            uploaded_file: None,
            placeholders: Some(report),
            ignored_fields: Vec::new(),
            retained_files: std::mem::take(&mut self.retained_files),
        })
    }

    /// Latest document, or a fresh empty one when the store has none
    async fn current_document(&mut self) -> Result<V3Document, UploadFailure> {
        let latest = documents::get_latest_document(self.db)
            .await
            .map_err(|e| self.fail_store(e))?;

        match latest {
            Some(document) => Ok(document),
            None => {
                tracing::info!("No V3 document yet, creating one");
                documents::create_document(self.db, None)
                    .await
                    .map_err(|e| self.fail_store(e))
            }
        }
    }

    fn transition(&mut self, next: UploadState) {
        tracing::info!(
            from = ?self.state,
            to = ?next,
            file_name = self.file_name.as_deref().unwrap_or("-"),
            "Upload state transition"
        );
        self.state = next;
    }

    fn fail(&mut self, status: u16, message: impl Into<String>) -> UploadFailure {
        let failed_at = self.state;
        let message = message.into();
        tracing::warn!(failed_at = ?failed_at, status, error = %message, "Upload failed");
        self.state = UploadState::Failed;

        UploadFailure {
            failed_at,
            status,
            message,
            file_name: self.file_name.clone(),
            retained_files: self.retained_files.clone(),
        }
    }

    fn fail_backend(&mut self, err: BackendError) -> UploadFailure {
        self.fail(err.status(), err.to_string())
    }

    fn fail_store(&mut self, err: v3dash_common::Error) -> UploadFailure {
        let api = ApiError::from(err);
        self.fail(api.status_code().as_u16(), api.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;

    fn part(name: &str) -> FilePart {
        FilePart {
            file_name: name.to_string(),
            content_type: None,
            bytes: b"data".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_rejects_unaccepted_files_without_backend() {
        let pool = init_memory_pool().await.unwrap();
        // Nothing listens here; a backend call would surface as a connection error
        let backend = BackendClient::new("http://127.0.0.1:9", None).unwrap();
        let mut orchestrator = UploadOrchestrator::new(&pool, &backend);

        let failure = orchestrator
            .process(vec![part("notes.txt")], AcceptMode::Both)
            .await
            .unwrap_err();

        assert_eq!(failure.failed_at, UploadState::Validating);
        assert_eq!(failure.status, 400);
        assert!(failure.message.contains(".pdf et .docx"));
        assert_eq!(orchestrator.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn test_docx_rejected_in_pdf_mode() {
        let pool = init_memory_pool().await.unwrap();
        let backend = BackendClient::new("http://127.0.0.1:9", None).unwrap();
        let mut orchestrator = UploadOrchestrator::new(&pool, &backend);

        let failure = orchestrator
            .process(vec![part("modele.docx")], AcceptMode::Pdf)
            .await
            .unwrap_err();
        assert_eq!(failure.message, "Seuls les fichiers .pdf sont acceptés");
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let pool = init_memory_pool().await.unwrap();
        let backend = BackendClient::new("http://127.0.0.1:9", None).unwrap();
        let mut orchestrator = UploadOrchestrator::new(&pool, &backend);

        let mut empty = part("vide.pdf");
        empty.bytes.clear();
        let failure = orchestrator.process(vec![empty], AcceptMode::Both).await.unwrap_err();
        assert_eq!(failure.failed_at, UploadState::Validating);
    }
}
