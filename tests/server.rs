//! HTTP endpoint tests: drive the axum router in-process with a fake
//! extractor and a scripted generator.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use doctype_classifier::server::{router, AppState, ClassifyResponse, HealthResponse};
use doctype_classifier::{
    Classifier, ClassifierConfig, DocClassError, DocumentKind, GenerationError, TextExtractor,
    TextGenerator,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----doctype-test-boundary";

const TAXONOMY: &str = r#"{"documents": [
    {"type_document": "Invoice", "description": "A bill", "champs": [{"nom": "amount"}]},
    {"type_document": "Payslip", "description": "Salary statement", "champs": [{"nom": "employer"}]}
]}"#;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Returns fixed text and records the paths it was asked to read, along
/// with whether each file existed at that moment.
struct FakeExtractor {
    text: Result<String, ()>,
    seen: Mutex<Vec<(PathBuf, DocumentKind, bool)>>,
}

impl FakeExtractor {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: Err(()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<(PathBuf, DocumentKind, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, DocClassError> {
        self.seen
            .lock()
            .unwrap()
            .push((path.to_path_buf(), kind, path.exists()));
        self.text.clone().map_err(|_| DocClassError::NoTextExtracted {
            path: path.to_path_buf(),
        })
    }
}

struct FixedGenerator(Result<String, GenerationError>);

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _: &str, _: f32, _: usize) -> Result<String, GenerationError> {
        self.0.clone()
    }
}

struct Fixture {
    _dir: TempDir,
    state: AppState,
}

fn fixture(extractor: Arc<FakeExtractor>, reply: Result<String, GenerationError>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let taxonomy_path = dir.path().join("list_type_doc.json");
    std::fs::write(&taxonomy_path, TAXONOMY).unwrap();
    let state = AppState {
        classifier: Classifier::new(Arc::new(FixedGenerator(reply)), ClassifierConfig::default()),
        extractor,
        taxonomy_path,
    };
    Fixture { _dir: dir, state }
}

fn upload(file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/classify-document/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const PDF_BYTES: &[u8] = b"%PDF-1.4\n% fake but well-formed enough for the magic check\n";

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_classifies_uploaded_pdf() {
    let extractor = FakeExtractor::new("Amount due: 10 EUR");
    let fx = fixture(
        extractor.clone(),
        Ok("TYPE: invoice\nJUSTIFICATION: amount due\nINFORMATIONS ADDITIONNELLES: 10 EUR".into()),
    );

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("bill.pdf", PDF_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: ClassifyResponse = json_body(response).await;
    assert_eq!(body.result.doc_type, "Invoice");
    assert_eq!(body.result.justification, "amount due");
    assert_eq!(body.result.additional_info, "10 EUR");

    let seen = extractor.seen();
    assert_eq!(seen.len(), 1);
    let (path, kind, existed) = &seen[0];
    assert_eq!(*kind, DocumentKind::Pdf);
    assert!(existed, "upload must be on disk while extracting");
    assert!(path.ends_with("bill.pdf"));
    assert!(!path.exists(), "temporary upload must be removed after the request");
}

#[tokio::test]
async fn test_response_uses_result_envelope() {
    let fx = fixture(FakeExtractor::new("x"), Ok("nothing useful".into()));

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("scan.PNG", b"\x89PNG fake"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = json_body(response).await;
    assert_eq!(body["result"]["type"], "Unclassifiable");
    assert_eq!(body["result"]["justification"], "");
    assert_eq!(body["result"]["additional_info"], "");
}

#[tokio::test]
async fn test_rejects_unsupported_extension() {
    let extractor = FakeExtractor::new("x");
    let fx = fixture(extractor.clone(), Ok("TYPE: Invoice".into()));

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("notes.docx", b"PK\x03\x04"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = json_body(response).await;
    assert_eq!(body["detail"], "Please provide a valid PDF or image.");
    assert!(extractor.seen().is_empty());
}

#[tokio::test]
async fn test_rejects_pdf_without_magic() {
    let extractor = FakeExtractor::new("x");
    let fx = fixture(extractor.clone(), Ok("TYPE: Invoice".into()));

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("renamed.pdf", b"GIF89a not a pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(extractor.seen().is_empty());
}

#[tokio::test]
async fn test_generation_failure_is_still_200() {
    let fx = fixture(
        FakeExtractor::new("Amount due"),
        Err(GenerationError::Provider("invalid api key".into())),
    );

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("bill.jpg", b"\xFF\xD8\xFF fake jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: ClassifyResponse = json_body(response).await;
    assert_eq!(body.result.doc_type, "Error");
    assert!(body.result.justification.contains("invalid api key"));
}

#[tokio::test]
async fn test_extraction_failure_is_500_and_cleans_up() {
    let extractor = FakeExtractor::failing();
    let fx = fixture(extractor.clone(), Ok("TYPE: Invoice".into()));

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("scan.jpeg", b"\xFF\xD8\xFF"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("No text"));

    let (path, kind, existed) = extractor.seen().remove(0);
    assert_eq!(kind, DocumentKind::Jpeg);
    assert!(existed);
    assert!(!path.exists(), "temporary upload must be removed on failure too");
}

#[tokio::test]
async fn test_missing_taxonomy_is_500() {
    let mut fx = fixture(FakeExtractor::new("x"), Ok("TYPE: Invoice".into()));
    fx.state.taxonomy_path = PathBuf::from("/definitely/not/here.json");

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("bill.pdf", PDF_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_upload_path_traversal_is_neutralised() {
    let extractor = FakeExtractor::new("x");
    let fx = fixture(extractor.clone(), Ok("TYPE: Payslip".into()));

    let response = router(fx.state, 1024 * 1024)
        .oneshot(upload("../../evil.pdf", PDF_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let (path, _, _) = extractor.seen().remove(0);
    assert_eq!(path.file_name().unwrap(), "evil.pdf");
    assert!(!path.to_string_lossy().contains(".."));
}

#[tokio::test]
async fn test_health_reports_taxonomy_size() {
    let fx = fixture(FakeExtractor::new("x"), Ok(String::new()));

    let response = router(fx.state, 1024)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthResponse = json_body(response).await;
    assert_eq!(body.status, "ok");
    assert_eq!(body.taxonomy_entries, 2);
}

#[tokio::test]
async fn test_health_unavailable_without_taxonomy() {
    let mut fx = fixture(FakeExtractor::new("x"), Ok(String::new()));
    fx.state.taxonomy_path = PathBuf::from("/definitely/not/here.json");

    let response = router(fx.state, 1024)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
