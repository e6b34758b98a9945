//! # V3 Dashboard Common Library
//!
//! Shared code for the V3 dashboard service including:
//! - The V3 field catalog and record type
//! - Completion rate and missing-field classification
//! - Upload accept-mode policy
//! - Document / uploaded-file models and statistics
//! - Presentation view-models for the dashboard
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod error;
pub mod models;
pub mod presentation;
pub mod time;
pub mod uuid_utils;
pub mod v3;

pub use error::{Error, Result};
pub use models::{FileStatus, NewUploadedFile, UploadedFile, V3Document, V3Stats};
pub use v3::{
    calculate_completion_rate, get_missing_fields, AcceptMode, FileKind, MissingField, Severity,
    V3Record, FIELD_CATALOG, FIELD_COUNT,
};
