//! HTTP backend.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Multipart `file` field, returns `{message, document_id}` |
//! | `POST` | `/compare` | Form fields `document_id`, `query`, returns `{comparison_result}` |
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/health` | Version and corpus load status |
//!
//! Upload failures answer `{"detail": ...}`, comparison failures answer
//! `{"error": ...}`. All origins, methods and headers are allowed.

use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use contract_review_core::{
    Comparator, ComparisonError, CorpusStatus, DocumentId, DocumentIndexer, LanguageModel,
    NamespaceStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

pub type SharedStore = Arc<dyn NamespaceStore>;
pub type SharedModel = Arc<dyn LanguageModel>;

/// Process-wide handles, built once by `main` and shared read-only by handlers.
#[derive(Clone)]
pub struct AppState {
    indexer: Arc<DocumentIndexer<SharedStore>>,
    comparator: Arc<Comparator<SharedStore, SharedModel>>,
    corpus: Arc<CorpusStatus>,
}

impl AppState {
    pub fn new(
        indexer: DocumentIndexer<SharedStore>,
        comparator: Comparator<SharedStore, SharedModel>,
        corpus: CorpusStatus,
    ) -> Self {
        Self {
            indexer: Arc::new(indexer),
            comparator: Arc::new(comparator),
            corpus: Arc::new(corpus),
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .route("/compare", post(handle_compare))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(
    bind: &str,
    state: AppState,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let app = router(state, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(bind = %bind, "contract review backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}

// ============ Errors ============

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    /// `detail` for uploads, `error` for comparisons.
    field: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();
        body.insert(self.field.to_string(), serde_json::Value::String(self.message));
        (self.status, Json(body)).into_response()
    }
}

fn upload_error(status: StatusCode, message: impl Into<String>) -> AppError {
    AppError {
        status,
        field: "detail",
        message: message.into(),
    }
}

fn compare_error(status: StatusCode, message: impl Into<String>) -> AppError {
    AppError {
        status,
        field: "error",
        message: message.into(),
    }
}

fn classify_comparison_error(err: ComparisonError) -> AppError {
    let status = match &err {
        ComparisonError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        ComparisonError::NotFound(_) => StatusCode::NOT_FOUND,
        ComparisonError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ComparisonError::Retrieval(_) | ComparisonError::Model(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    compare_error(status, err.to_string())
}

// ============ GET / and /health ============

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "AI Legal Document Reviewer Backend is running".to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    corpus: CorpusStatus,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        corpus: state.corpus.as_ref().clone(),
    })
}

// ============ POST /upload ============

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    message: String,
    document_id: String,
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| upload_error(err.status(), err.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| upload_error(err.status(), err.body_text()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(upload_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "multipart field `file` is required",
        ));
    };

    let document_id = DocumentId::new();
    state
        .indexer
        .index(&bytes, document_id)
        .await
        .map_err(|err| {
            error!(%document_id, file = ?file_name, error = %err, "upload failed");
            upload_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;

    Ok(Json(UploadResponse {
        message: "Document uploaded and stored successfully".to_string(),
        document_id: document_id.to_string(),
    }))
}

// ============ POST /compare ============

#[derive(Debug, Deserialize)]
pub struct CompareForm {
    document_id: String,
    query: String,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    comparison_result: String,
}

async fn handle_compare(
    State(state): State<AppState>,
    Form(form): Form<CompareForm>,
) -> Result<Json<CompareResponse>, AppError> {
    let document_id: DocumentId = form.document_id.parse().map_err(|_| {
        compare_error(
            StatusCode::BAD_REQUEST,
            format!("invalid document_id: {}", form.document_id),
        )
    })?;

    let outcome = state
        .comparator
        .compare(document_id, &form.query)
        .await
        .map_err(|err| {
            error!(%document_id, error = %err, "comparison failed");
            classify_comparison_error(err)
        })?;

    Ok(Json(CompareResponse {
        comparison_result: outcome.into_text(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use contract_review_core::{
        ComparisonOptions, ExtractionError, InMemoryStore, IssuedDocuments, LopdfExtractor,
        ModelError, Namespace, PageText, PdfExtractor, TextSplitter, Throttle,
        NO_MATCHES_MESSAGE,
    };
    use serde_json::Value;
    use std::path::Path;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "contract-review-test-boundary";

    struct CannedModel;

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn invoke(&self, _prompt: &str) -> Result<String, ModelError> {
            Ok("Alignment with Legal Standards: aligned.".to_string())
        }
    }

    /// Every page of every upload comes back without text.
    struct TextlessPages;

    impl PdfExtractor for TextlessPages {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<PageText>, ExtractionError> {
            Ok(vec![PageText {
                number: 1,
                text: String::new(),
            }])
        }
    }

    fn state_with(store: SharedStore, corpus: CorpusStatus) -> AppState {
        state_with_extractor(store, corpus, Arc::new(LopdfExtractor))
    }

    fn state_with_extractor(
        store: SharedStore,
        corpus: CorpusStatus,
        extractor: Arc<dyn PdfExtractor + Send + Sync>,
    ) -> AppState {
        let staging = std::env::temp_dir().join("contract-review-tests");
        let issued = IssuedDocuments::new();
        let indexer = DocumentIndexer::new(store.clone(), TextSplitter::default(), staging)
            .with_extractor(extractor)
            .with_issued_documents(issued.clone());
        let model: SharedModel = Arc::new(CannedModel);
        let comparator = Comparator::new(
            store,
            model,
            ComparisonOptions {
                throttle: Throttle::none(),
                model_timeout: Duration::from_secs(5),
                ..ComparisonOptions::default()
            },
        )
        .with_issued_documents(issued);
        AppState::new(indexer, comparator, corpus)
    }

    fn upload_request(field: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"contract.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn compare_request(document_id: &str, query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/compare")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("document_id={document_id}&query={query}")))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn seeded_corpus() -> SharedStore {
        let store: SharedStore = Arc::new(InMemoryStore::new());
        store
            .upsert(
                &Namespace::Corpus,
                &Namespace::Corpus.records(["Notice of termination must be given in writing."]),
            )
            .await
            .unwrap();
        store
    }

    fn form(document_id: &str, query: &str) -> Form<CompareForm> {
        Form(CompareForm {
            document_id: document_id.to_string(),
            query: query.to_string(),
        })
    }

    #[tokio::test]
    async fn compare_returns_model_text_for_indexed_document() {
        let store: SharedStore = Arc::new(InMemoryStore::new());
        let id = DocumentId::new();
        let namespace = Namespace::Document(id);
        store
            .upsert(&namespace, &namespace.records(["Notice period is one week."]))
            .await
            .unwrap();

        let state = state_with(store, CorpusStatus::Missing);
        let Json(response) = handle_compare(State(state), form(&id.to_string(), "notice"))
            .await
            .unwrap();
        assert_eq!(
            response.comparison_result,
            "Alignment with Legal Standards: aligned."
        );
    }

    #[tokio::test]
    async fn compare_reports_unknown_document_as_404() {
        let state = state_with(Arc::new(InMemoryStore::new()), CorpusStatus::Missing);
        let err = handle_compare(State(state), form(&DocumentId::new().to_string(), "notice"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.field, "error");
    }

    #[tokio::test]
    async fn compare_rejects_malformed_ids() {
        let state = state_with(Arc::new(InMemoryStore::new()), CorpusStatus::Missing);
        let err = handle_compare(State(state), form("legal-standards", "notice"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        let err = classify_comparison_error(ComparisonError::Timeout(Duration::from_secs(1)));
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn no_matches_text_is_passed_through() {
        let outcome = contract_review_core::ComparisonOutcome::NoMatches;
        assert_eq!(outcome.into_text(), NO_MATCHES_MESSAGE);
    }

    #[tokio::test]
    async fn health_exposes_corpus_status() {
        let state = state_with(
            Arc::new(InMemoryStore::new()),
            CorpusStatus::Loaded { chunks: 7 },
        );
        let Json(health) = handle_health(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.corpus, CorpusStatus::Loaded { chunks: 7 });
    }

    #[tokio::test]
    async fn upload_returns_document_id_and_textless_pdf_can_be_compared() {
        let state = state_with_extractor(
            seeded_corpus().await,
            CorpusStatus::Loaded { chunks: 1 },
            Arc::new(TextlessPages),
        );
        let app = router(state, 1024 * 1024);

        let (status, body) = send(app.clone(), upload_request("file", b"%PDF-1.4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Document uploaded and stored successfully");
        let document_id = body["document_id"].as_str().unwrap().to_string();
        assert!(document_id.parse::<DocumentId>().is_ok());

        let (status, body) = send(app, compare_request(&document_id, "termination")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["comparison_result"],
            "Alignment with Legal Standards: aligned."
        );
    }

    #[tokio::test]
    async fn upload_without_file_field_is_unprocessable() {
        let app = router(
            state_with(Arc::new(InMemoryStore::new()), CorpusStatus::Missing),
            1024 * 1024,
        );

        let (status, body) = send(app, upload_request("attachment", b"%PDF-1.4")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("`file`"));
    }

    #[tokio::test]
    async fn corrupt_upload_is_a_server_error_with_detail() {
        let app = router(
            state_with(Arc::new(InMemoryStore::new()), CorpusStatus::Missing),
            1024 * 1024,
        );

        let (status, body) = send(app, upload_request("file", b"%PDF-1.4\n%broken")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].is_string());
        assert!(body.get("error").is_none());
    }
}
