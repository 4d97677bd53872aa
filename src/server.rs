//! HTTP boundary: upload a document, get its classification back.
//!
//! ## Routes
//!
//! | Method | Path                   | Body                         |
//! |--------|------------------------|------------------------------|
//! | POST   | `/classify-document/`  | multipart, one file part     |
//! | GET    | `/health`              | —                            |
//!
//! The upload is written into a fresh `TempDir` under its original file
//! name, extracted, classified, and the directory is removed when the
//! handler returns, on success and on every error path alike.

use crate::classify::Classifier;
use crate::config::ServerConfig;
use crate::error::DocClassError;
use crate::extract::TextExtractor;
use crate::pipeline::input::DocumentKind;
use crate::response::ClassificationResult;
use crate::taxonomy::Taxonomy;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Classifier,
    pub extractor: Arc<dyn TextExtractor>,
    pub taxonomy_path: PathBuf,
}

/// Body of a successful `/classify-document/` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub result: ClassificationResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub taxonomy_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error response: a status code and a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<DocClassError> for ApiError {
    fn from(e: DocClassError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}", self.detail);
        }
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/classify-document/", post(classify_document))
        .route("/classify-document", post(classify_document))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind` and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<(), DocClassError> {
    let app = router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| DocClassError::Internal(format!("Failed to bind {}: {}", config.bind, e)))?;
    info!("Listening on http://{}", config.bind);
    info!("Taxonomy: {}", config.taxonomy_path.display());

    axum::serve(listener, app)
        .await
        .map_err(|e| DocClassError::Internal(format!("Server error: {}", e)))
}

/// Classify an uploaded PDF or image.
async fn classify_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let (file_name, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?
            .ok_or_else(|| ApiError::bad_request("Missing file upload"))?;

        if let Some(name) = field.file_name().map(|n| n.to_string()) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            break (name, bytes);
        }
    };

    let kind = DocumentKind::from_name(&file_name).ok_or_else(|| {
        warn!("Rejected upload '{}': unsupported file type", file_name);
        ApiError::from(DocClassError::UnsupportedFileType {
            name: file_name.clone(),
        })
    })?;
    info!("Received '{}' ({} bytes)", file_name, bytes.len());

    // Removed on drop, whichever way this function returns.
    let temp_dir = TempDir::new().map_err(|e| DocClassError::Internal(e.to_string()))?;
    let temp_path = temp_dir.path().join(safe_file_name(&file_name));
    tokio::fs::write(&temp_path, &bytes)
        .await
        .map_err(|e| DocClassError::Internal(format!("Failed to save upload: {}", e)))?;

    let taxonomy = Taxonomy::load(&state.taxonomy_path).await?;
    let result = classify_saved(&state, &taxonomy, &temp_path, kind).await?;

    Ok(Json(ClassifyResponse { result }))
}

async fn classify_saved(
    state: &AppState,
    taxonomy: &Taxonomy,
    path: &Path,
    kind: DocumentKind,
) -> Result<ClassificationResult, DocClassError> {
    crate::pipeline::input::check_file(path)?;
    let text = state.extractor.extract(path, kind).await?;
    Ok(state.classifier.classify(taxonomy, &text).await)
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match Taxonomy::load(&state.taxonomy_path).await {
        Ok(t) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                taxonomy_entries: t.len(),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "error".to_string(),
                taxonomy_entries: 0,
                error: Some(e.to_string()),
            }),
        ),
    }
}

/// Keep only the final path component of a client-supplied file name.
fn safe_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base == "." || base == ".." {
        "upload".to_string()
    } else {
        base.to_string()
    }
}
