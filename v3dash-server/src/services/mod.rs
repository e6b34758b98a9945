//! Services: extraction backend client and upload orchestration

pub mod backend_client;
pub mod upload_orchestrator;

pub use backend_client::{BackendClient, BackendError, FilePart, PlaceholderReport};
pub use upload_orchestrator::{UploadFailure, UploadOrchestrator, UploadReport, UploadState};
