//! Which dropped files the dashboard accepts, and which one it submits

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// MIME type of a `.pdf` file
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of a `.docx` file
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Kind of file the dashboard knows how to process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
}

impl FileKind {
    /// Classify by extension (case-insensitive)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(FileKind::Pdf)
        } else if lower.ends_with(".docx") {
            Some(FileKind::Docx)
        } else {
            None
        }
    }

    /// Canonical MIME type for this kind
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => PDF_MIME,
            FileKind::Docx => DOCX_MIME,
        }
    }
}

/// Accept mode configured for the upload zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptMode {
    Pdf,
    Docx,
    #[default]
    Both,
}

impl AcceptMode {
    /// Whether files of `kind` may be submitted
    pub fn accepts(&self, kind: FileKind) -> bool {
        matches!(
            (self, kind),
            (AcceptMode::Both, _)
                | (AcceptMode::Pdf, FileKind::Pdf)
                | (AcceptMode::Docx, FileKind::Docx)
        )
    }

    /// Extensions named in the rejection message
    pub fn extensions_label(&self) -> &'static str {
        match self {
            AcceptMode::Pdf => ".pdf",
            AcceptMode::Docx => ".docx",
            AcceptMode::Both => ".pdf et .docx",
        }
    }

    /// User-facing message when no dropped file is acceptable
    pub fn rejection_message(&self) -> String {
        format!("Seuls les fichiers {} sont acceptés", self.extensions_label())
    }

    /// Order dropped files for submission.
    ///
    /// Returns indices of acceptable files: every PDF (if accepted) followed by
    /// every DOCX (if accepted), each group in drop order. Only the first entry
    /// is submitted; the rest are kept for display.
    pub fn valid_files<S: AsRef<str>>(&self, names: &[S]) -> Vec<usize> {
        let mut valid = Vec::new();
        for kind in [FileKind::Pdf, FileKind::Docx] {
            if !self.accepts(kind) {
                continue;
            }
            valid.extend(
                names
                    .iter()
                    .enumerate()
                    .filter(|(_, name)| FileKind::from_file_name(name.as_ref()) == Some(kind))
                    .map(|(idx, _)| idx),
            );
        }
        valid
    }
}

impl fmt::Display for AcceptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AcceptMode::Pdf => "pdf",
            AcceptMode::Docx => "docx",
            AcceptMode::Both => "both",
        };
        f.write_str(s)
    }
}

impl FromStr for AcceptMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(AcceptMode::Pdf),
            "docx" => Ok(AcceptMode::Docx),
            "both" => Ok(AcceptMode::Both),
            other => Err(Error::InvalidInput(format!(
                "Unknown accept mode '{}' (expected pdf, docx or both)",
                other
            ))),
        }
    }
}
