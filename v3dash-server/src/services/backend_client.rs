//! Extraction/NLP backend client
//!
//! Thin reqwest wrapper over the external backend: PDF text extraction,
//! text-to-V3 field processing, DOCX placeholder reports and raw forwarding.
//! No retries; a timeout applies only when configured.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("v3dash/", env!("CARGO_PKG_VERSION"));

/// Backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend unreachable or connection dropped
    #[error("Erreur de connexion au backend: {0}")]
    Connection(String),

    /// Backend answered with a non-2xx status
    #[error("Erreur du backend: {detail}")]
    Status { status: u16, detail: String },

    /// Backend answered 2xx with a body we could not read
    #[error("Erreur lors du parsing de la réponse du backend: {0}")]
    Parse(String),
}

impl BackendError {
    /// HTTP status to report for this failure
    pub fn status(&self) -> u16 {
        match self {
            BackendError::Status { status, .. } => *status,
            BackendError::Connection(_) | BackendError::Parse(_) => 500,
        }
    }
}

/// A file to submit to the backend
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    /// Content type announced by the uploader, if any
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn default_success() -> bool {
    true
}

/// `/extract-pdf-text/` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfTextResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `/process-text-for-v3/` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V3ProcessingResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<serde_json::Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl V3ProcessingResponse {
    /// Returned fields as strings (`null` reads as unfilled)
    pub fn fields(&self) -> Option<HashMap<String, String>> {
        self.data.as_ref().map(|data| {
            data.iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect()
        })
    }
}

/// One placeholder and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderCount {
    pub placeholder: String,
    pub count: u64,
    /// Where each occurrence sits in the template (advanced analysis only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Normalized placeholder-occurrence report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderReport {
    pub total_found: u64,
    pub unique_count: u64,
    pub unique_placeholders: Vec<PlaceholderCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Placeholder entries come back either as bare names or as objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlaceholder {
    Name(String),
    Entry {
        placeholder: String,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        occurrences: Option<u64>,
        #[serde(default)]
        contexts: Vec<Value>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
        #[serde(default)]
        detected_type: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct RawPlaceholderReport {
    #[serde(default)]
    total_found: Option<u64>,
    #[serde(default)]
    unique_count: Option<u64>,
    #[serde(default)]
    unique_placeholders: Vec<RawPlaceholder>,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawPlaceholderReport> for PlaceholderReport {
    fn from(raw: RawPlaceholderReport) -> Self {
        let unique_placeholders: Vec<PlaceholderCount> = raw
            .unique_placeholders
            .into_iter()
            .map(|entry| match entry {
                RawPlaceholder::Name(placeholder) => PlaceholderCount {
                    placeholder,
                    count: 1,
                    contexts: Vec::new(),
                    kind: None,
                },
                RawPlaceholder::Entry {
                    placeholder,
                    count,
                    occurrences,
                    contexts,
                    kind,
                    detected_type,
                } => PlaceholderCount {
                    placeholder,
                    count: count.or(occurrences).unwrap_or(1),
                    contexts,
                    kind: kind.or(detected_type),
                },
            })
            .collect();

        let total_found = raw
            .total_found
            .unwrap_or_else(|| unique_placeholders.iter().map(|p| p.count).sum());
        let unique_count = raw
            .unique_count
            .unwrap_or(unique_placeholders.len() as u64);

        PlaceholderReport {
            total_found,
            unique_count,
            unique_placeholders,
            error: raw.error,
        }
    }
}

/// Raw response relayed by [`BackendClient::forward`]
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Extraction backend client, built once at startup
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    /// `base_url` must already be normalized (no trailing slash)
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST the PDF to `/extract-pdf-text/`
    pub async fn extract_pdf_text(&self, file: &FilePart) -> Result<PdfTextResponse, BackendError> {
        tracing::debug!(file_name = %file.file_name, size = file.size(), "Extracting PDF text");
        let form = reqwest::multipart::Form::new().part("file", file_part(file)?);
        let response = self
            .http
            .post(self.url("/extract-pdf-text/"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        read_json(response).await
    }

    /// POST extracted text plus the current record to `/process-text-for-v3/`
    pub async fn process_text_for_v3(
        &self,
        text: &str,
        current_data: &HashMap<String, String>,
    ) -> Result<V3ProcessingResponse, BackendError> {
        tracing::debug!(text_len = text.len(), "Processing text for V3");
        let body = serde_json::json!({
            "text": text,
            "current_data": current_data,
        });
        let response = self
            .http
            .post(self.url("/process-text-for-v3/"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        read_json(response).await
    }

    /// POST a DOCX to `/extract-placeholders/`
    pub async fn extract_placeholders(&self, file: &FilePart) -> Result<PlaceholderReport, BackendError> {
        self.placeholder_report("/extract-placeholders/", file).await
    }

    /// POST a DOCX to `/analyze-template-advanced/` (placeholders with detected types)
    pub async fn analyze_template_advanced(
        &self,
        file: &FilePart,
    ) -> Result<PlaceholderReport, BackendError> {
        self.placeholder_report("/analyze-template-advanced/", file).await
    }

    async fn placeholder_report(
        &self,
        path: &str,
        file: &FilePart,
    ) -> Result<PlaceholderReport, BackendError> {
        tracing::debug!(file_name = %file.file_name, path, "Requesting placeholder report");
        let form = reqwest::multipart::Form::new().part("file", file_part(file)?);
        let response = self
            .http
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let raw: RawPlaceholderReport = read_json(response).await?;
        Ok(raw.into())
    }

    /// Relay a request unchanged; any status is returned, not turned into an error
    pub async fn forward(
        &self,
        method: &str,
        path: &str,
        query: Option<&str>,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> Result<ForwardedResponse, BackendError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        let mut url = self.url(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        tracing::debug!(%method, %url, "Forwarding request to backend");

        let mut request = self.http.request(method, &url).body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?
            .to_vec();

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }
}

fn file_part(file: &FilePart) -> Result<reqwest::multipart::Part, BackendError> {
    let mime = file
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());
    reqwest::multipart::Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&mime)
        .map_err(|e| BackendError::Connection(e.to_string()))
}

/// Decode a 2xx JSON body, or turn a non-2xx into `BackendError::Status`
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::Connection(e.to_string()))?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), body = %body, "Backend returned an error");
        return Err(BackendError::Status {
            status: status.as_u16(),
            detail: upstream_detail(&body, status.canonical_reason()),
        });
    }

    serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
}

/// The backend's `detail` when the body is JSON, else the raw body, else the status text
pub fn upstream_detail(body: &str, reason: Option<&str>) -> String {
    let detail = match serde_json::from_str::<Value>(body) {
        Ok(json) => match json.get("detail") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
        Err(_) => body.trim().to_string(),
    };

    if detail.is_empty() {
        reason.unwrap_or("Erreur inconnue").to_string()
    } else {
        detail
    }
}
