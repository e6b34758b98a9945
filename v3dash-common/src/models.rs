//! Document and uploaded-file models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::v3::V3Record;
use crate::Error;

/// Processing status of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Processed,
    Pending,
    Error,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Processed => "processed",
            FileStatus::Pending => "pending",
            FileStatus::Error => "error",
        }
    }

    /// Label shown in the document table
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Processed => "Traité",
            FileStatus::Pending => "En attente",
            FileStatus::Error => "Erreur",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processed" => Ok(FileStatus::Processed),
            "pending" => Ok(FileStatus::Pending),
            "error" => Ok(FileStatus::Error),
            other => Err(Error::InvalidInput(format!("Unknown file status: {}", other))),
        }
    }
}

/// Record of a processed upload, attached to one V3 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub status: FileStatus,
    pub v3_document_id: String,
}

/// File metadata supplied when attaching a file to a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUploadedFile {
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub status: FileStatus,
}

impl NewUploadedFile {
    /// Reject metadata with an empty name or type, or a non-positive size
    pub fn validate(&self) -> crate::Result<()> {
        if self.file_name.trim().is_empty()
            || self.file_type.trim().is_empty()
            || self.file_size <= 0
        {
            return Err(Error::InvalidInput(
                "Informations de fichier incomplètes".to_string(),
            ));
        }
        Ok(())
    }
}

/// The evolving V3 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V3Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Always `calculate_completion_rate(&data)` at the last write
    pub completion_rate: u8,
    /// Incremented on every write; used for compare-and-swap updates
    pub version: i64,
    pub data: V3Record,
    #[serde(default)]
    pub uploaded_files: Vec<UploadedFile>,
}

/// Upload counts by status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileStats {
    pub total: i64,
    pub processed: i64,
    pub pending: i64,
    pub error: i64,
}

/// Document counts by completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
}

/// Statistics reported by `/api/v3/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V3Stats {
    pub files: FileStats,
    pub v3_documents: DocumentStats,
}
