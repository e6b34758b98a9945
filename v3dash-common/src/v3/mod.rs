//! The V3 form: field catalog, record, completion and missing-field grading

pub mod accept;
pub mod catalog;
pub mod completion;
pub mod missing;
pub mod record;

pub use accept::{AcceptMode, FileKind};
pub use catalog::{field_label, FIELD_CATALOG, FIELD_COUNT};
pub use completion::calculate_completion_rate;
pub use missing::{get_missing_fields, MissingField, Severity};
pub use record::{MergeSummary, V3Record};
