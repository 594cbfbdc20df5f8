use crate::models::DocumentId;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("model returned no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("store upsert failed: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("extraction task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error("language model did not answer within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("document not found: {0}")]
    NotFound(DocumentId),

    #[error("language model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
