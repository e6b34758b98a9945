//! Dashboard view-models
//!
//! Pure projections of documents, files and statistics into what the
//! dashboard displays: completion gauge, missing-info list, document table,
//! activity summary and notifications.

use serde::Serialize;

use crate::models::{FileStatus, UploadedFile, V3Document, V3Stats};
use crate::time::format_display;
use crate::v3::{get_missing_fields, Severity, FIELD_COUNT};

/// Message attached to every missing-info entry
pub const MISSING_VALUE_MESSAGE: &str = "Valeur non renseignée dans le document source";

/// Gauge colour band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeColor {
    Red,
    Yellow,
    Green,
}

impl GaugeColor {
    pub fn for_percentage(percentage: u8) -> Self {
        if percentage < 30 {
            GaugeColor::Red
        } else if percentage < 70 {
            GaugeColor::Yellow
        } else {
            GaugeColor::Green
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionGauge {
    pub completion_percentage: u8,
    pub completed_fields: usize,
    pub total_fields: usize,
    /// `None` when no document exists yet
    pub last_updated: Option<String>,
    pub color: GaugeColor,
}

impl CompletionGauge {
    pub fn from_document(document: Option<&V3Document>) -> Self {
        match document {
            Some(doc) => Self {
                completion_percentage: doc.completion_rate,
                completed_fields: doc.data.filled_count(),
                total_fields: FIELD_COUNT,
                last_updated: Some(format_display(&doc.updated_at)),
                color: GaugeColor::for_percentage(doc.completion_rate),
            },
            None => Self {
                completion_percentage: 0,
                completed_fields: 0,
                total_fields: FIELD_COUNT,
                last_updated: None,
                color: GaugeColor::Red,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingInfoItem {
    pub id: String,
    pub field: String,
    pub message: String,
    pub severity: Severity,
    pub severity_label: &'static str,
}

/// Missing-info list for a document (empty when there is none)
pub fn missing_info(document: Option<&V3Document>) -> Vec<MissingInfoItem> {
    let Some(doc) = document else {
        return Vec::new();
    };

    get_missing_fields(&doc.data)
        .into_iter()
        .enumerate()
        .map(|(idx, missing)| MissingInfoItem {
            id: format!("m{}", idx + 1),
            field: missing.field,
            message: MISSING_VALUE_MESSAGE.to_string(),
            severity: missing.severity,
            severity_label: missing.severity.label(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRow {
    pub id: String,
    pub name: String,
    pub date: String,
    pub status: FileStatus,
    pub status_label: &'static str,
}

/// Document-history table rows, in the order given
pub fn document_rows(files: &[UploadedFile]) -> Vec<DocumentRow> {
    files
        .iter()
        .map(|file| DocumentRow {
            id: file.id.clone(),
            name: file.file_name.clone(),
            date: format_display(&file.created_at),
            status: file.status,
            status_label: file.status.label(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub processed: i64,
    pub pending: i64,
    pub completed: i64,
}

impl From<&V3Stats> for ActivitySummary {
    fn from(stats: &V3Stats) -> Self {
        Self {
            processed: stats.files.processed,
            pending: stats.files.pending,
            completed: stats.v3_documents.completed,
        }
    }
}

/// Everything the dashboard home page shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub gauge: CompletionGauge,
    pub missing_info: Vec<MissingInfoItem>,
    pub documents: Vec<DocumentRow>,
    pub activity: ActivitySummary,
}

impl DashboardView {
    pub fn build(document: Option<&V3Document>, stats: &V3Stats) -> Self {
        Self {
            gauge: CompletionGauge::from_document(document),
            missing_info: missing_info(document),
            documents: document
                .map(|doc| document_rows(&doc.uploaded_files))
                .unwrap_or_default(),
            activity: ActivitySummary::from(stats),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Dismissible notification shown after an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Notification {
    pub fn success(details: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: "Document traité avec succès!".to_string(),
            details: Some(details.into()),
        }
    }

    pub fn error(details: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: "Erreur".to_string(),
            details: Some(details.into()),
        }
    }
}
