//! Integration tests for POST /api/upload (upload orchestrator)
//!
//! Tests cover:
//! - Validation failures never reach the backend
//! - Backend failures surface their detail and leave the store untouched
//! - PDF path: extract → merge onto latest document → commit with file record
//! - DOCX path: placeholder report only
//! - Selection policy: PDFs first, first match processed, rest retained

mod helpers;

use helpers::TestApp;
use serde_json::json;
use wiremock::matchers::{any, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_pdf_extraction(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/extract-pdf-text/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "text": text
        })))
        .mount(server)
        .await;
}

// =============================================================================
// Validating
// =============================================================================

#[tokio::test]
async fn test_unaccepted_extension_fails_without_backend_call() {
    let backend = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (status, body) = app
        .post_files(
            "/api/upload?accept=both",
            &[("notes.txt", "text/plain", &b"bonjour"[..])],
        )
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["failedAt"], "validating");
    assert!(body["error"].as_str().unwrap().contains(".pdf et .docx"));
    assert_eq!(body["notification"]["kind"], "error");
    assert_eq!(body["notification"]["message"], "Erreur");
}

#[tokio::test]
async fn test_unknown_accept_mode_is_400() {
    let app = TestApp::without_backend().await;
    let (status, body) = app
        .post_files(
            "/api/upload?accept=xlsx",
            &[("rapport.pdf", "application/pdf", &b"%PDF"[..])],
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

// =============================================================================
// PDF path
// =============================================================================

#[tokio::test]
async fn test_extraction_failure_surfaces_detail_without_mutation() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/extract-pdf-text/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/process-text-for-v3/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (status, body) = app
        .post_files(
            "/api/upload",
            &[("rapport.pdf", "application/pdf", &b"%PDF-1.4"[..])],
        )
        .await;

    assert_eq!(status, 500);
    assert_eq!(body["failedAt"], "extracting");
    assert!(body["error"].as_str().unwrap().contains("boom"));

    // No document was created or changed
    let (status, _) = app.get("/api/v3/latest").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_pdf_upload_creates_document_and_records_file() {
    let backend = MockServer::start().await;
    mock_pdf_extraction(&backend, "Projet: Ecole").await;
    Mock::given(method("POST"))
        .and(path("/process-text-for-v3/"))
        .and(body_partial_json(json!({ "text": "Projet: Ecole" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "nom_projet": "Ecole", "champ_inconnu": "x" }
        })))
        .expect(1)
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (status, body) = app
        .post_files(
            "/api/upload",
            &[("rapport.pdf", "application/pdf", &b"%PDF-1.4"[..])],
        )
        .await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"], "PDF traité avec succès");
    assert_eq!(body["data"]["document"]["data"]["nom_projet"], "Ecole");
    assert_eq!(body["data"]["document"]["completionRate"], 1);
    assert_eq!(body["data"]["uploadedFile"]["fileType"], "application/pdf");
    assert_eq!(body["data"]["uploadedFile"]["fileSize"], 8);
    assert_eq!(body["data"]["ignoredFields"], json!(["champ_inconnu"]));
    assert_eq!(body["notification"]["kind"], "success");
    assert_eq!(body["notification"]["message"], "Document traité avec succès!");

    let (_, stats) = app.get("/api/v3/stats").await;
    assert_eq!(stats["data"]["files"]["processed"], 1);
    assert_eq!(stats["data"]["v3Documents"]["total"], 1);
}

#[tokio::test]
async fn test_pdf_merge_keeps_existing_values() {
    let backend = MockServer::start().await;
    mock_pdf_extraction(&backend, "texte").await;
    // The current record is sent along with the text
    Mock::given(method("POST"))
        .and(path("/process-text-for-v3/"))
        .and(body_partial_json(json!({ "current_data": { "nom_MO": "Ville" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "nom_projet": "Ecole", "date_projet": "" }
        })))
        .expect(1)
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (_, created) = app
        .post_json(
            "/api/v3/create",
            json!({ "data": { "nom_MO": "Ville", "date_projet": "2024" } }),
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post_files(
            "/api/upload?accept=pdf",
            &[("rapport.pdf", "application/pdf", &b"%PDF-1.4"[..])],
        )
        .await;
    assert_eq!(status, 200, "{}", body);

    let document = &body["data"]["document"];
    assert_eq!(document["id"], id.as_str());
    assert_eq!(document["version"], 2);
    assert_eq!(document["data"]["nom_MO"], "Ville");
    assert_eq!(document["data"]["nom_projet"], "Ecole");
    // Incoming keys overwrite, even with an empty value
    assert_eq!(document["data"]["date_projet"], "");
    assert_eq!(document["uploadedFiles"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_processing_failure_reports_merging_state() {
    let backend = MockServer::start().await;
    mock_pdf_extraction(&backend, "texte").await;
    Mock::given(method("POST"))
        .and(path("/process-text-for-v3/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "detail": "texte vide" })))
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (status, body) = app
        .post_files(
            "/api/upload",
            &[("rapport.pdf", "application/pdf", &b"%PDF-1.4"[..])],
        )
        .await;

    assert_eq!(status, 422);
    assert_eq!(body["failedAt"], "merging");
    assert_eq!(body["error"], "Erreur du backend: texte vide");

    let (_, stats) = app.get("/api/v3/stats").await;
    assert_eq!(stats["data"]["files"]["total"], 0);
}

#[tokio::test]
async fn test_extraction_without_text_fails() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/extract-pdf-text/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "PDF protégé"
        })))
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (status, body) = app
        .post_files(
            "/api/upload",
            &[("rapport.pdf", "application/pdf", &b"%PDF-1.4"[..])],
        )
        .await;

    assert_eq!(status, 500);
    assert_eq!(body["failedAt"], "extracting");
    assert_eq!(body["error"], "PDF protégé");
}

// =============================================================================
// DOCX path
// =============================================================================

#[tokio::test]
async fn test_docx_upload_reports_placeholders_only() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/extract-placeholders/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_found": 4,
            "unique_placeholders": ["{{nom}}", "{{date}}"]
        })))
        .expect(1)
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (status, body) = app
        .post_files(
            "/api/upload?accept=docx",
            &[("modele.DOCX", "application/octet-stream", &b"PK"[..])],
        )
        .await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["kind"], "docx");
    assert_eq!(body["data"]["message"], "4 placeholders trouvés, 2 uniques.");
    assert_eq!(body["data"]["placeholders"]["unique_count"], 2);
    assert!(body["data"]["document"].is_null());

    // The document lifecycle is bypassed entirely
    let (status, _) = app.get("/api/v3/latest").await;
    assert_eq!(status, 404);
}

// =============================================================================
// Selection policy
// =============================================================================

#[tokio::test]
async fn test_first_pdf_is_processed_and_others_retained() {
    let backend = MockServer::start().await;
    mock_pdf_extraction(&backend, "texte").await;
    Mock::given(method("POST"))
        .and(path("/process-text-for-v3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {}
        })))
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/extract-placeholders/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;
    let app = TestApp::new(&backend.uri()).await;

    let (status, body) = app
        .post_files(
            "/api/upload?accept=both",
            &[
                ("modele.docx", "application/octet-stream", &b"PK"[..]),
                ("notes.txt", "text/plain", &b"x"[..]),
                ("a.pdf", "application/pdf", &b"%PDF-a"[..]),
                ("b.pdf", "application/pdf", &b"%PDF-b"[..]),
            ],
        )
        .await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["fileName"], "a.pdf");
    assert_eq!(body["data"]["retainedFiles"], json!(["b.pdf", "modele.docx"]));

    let (_, files) = app.get("/api/v3/files").await;
    assert_eq!(files["data"].as_array().unwrap().len(), 1);
}
