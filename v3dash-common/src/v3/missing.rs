//! Missing-field classification

use serde::{Deserialize, Serialize};

use super::catalog::{field_label, HIGH_PRIORITY_FIELDS, MEDIUM_PRIORITY_FIELDS};
use super::record::V3Record;

/// Priority of a missing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Grade a raw catalog key by priority-list membership
    pub fn for_field(key: &str) -> Self {
        if HIGH_PRIORITY_FIELDS.iter().any(|k| *k == key) {
            Severity::High
        } else if MEDIUM_PRIORITY_FIELDS.iter().any(|k| *k == key) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Label shown on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "Élevée",
            Severity::Medium => "Moyenne",
            Severity::Low => "Faible",
        }
    }
}

/// An unfilled field and its severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    /// Raw catalog key
    pub key: &'static str,
    /// Display label (underscores replaced by spaces)
    pub field: String,
    pub severity: Severity,
}

/// Every unfilled field of `record`, in catalog order
pub fn get_missing_fields(record: &V3Record) -> Vec<MissingField> {
    record
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| MissingField {
            key,
            field: field_label(key),
            severity: Severity::for_field(key),
        })
        .collect()
}
