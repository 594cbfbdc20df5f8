use clap::{Args, Parser, Subcommand, ValueEnum};
use contract_review_core::{
    ChunkingConfig, ComparisonOptions, Throttle, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_TOP_K,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "contract-review", version, about = "Review contracts against legal standards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP backend.
    Serve(ServeArgs),
    /// Upload a PDF to a running backend and print its document id.
    Upload {
        /// PDF to upload.
        #[arg(long)]
        file: PathBuf,

        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Ask a running backend to compare an uploaded document with the corpus.
    Compare {
        /// Id returned by `upload`.
        #[arg(long)]
        document_id: String,

        /// Question about the contract.
        #[arg(long)]
        query: String,

        /// Print the model output exactly as returned.
        #[arg(long, default_value_t = false)]
        raw: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[derive(Args, Clone)]
pub struct BackendArgs {
    /// Base URL of the backend.
    #[arg(long, env = "BACKEND_URL", default_value = "http://localhost:8000")]
    pub backend_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Pinecone,
    Memory,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// Reference legal standards PDF loaded at startup.
    #[arg(long, env = "LEGAL_CORPUS_PATH", default_value = "legal_corpus.pdf")]
    pub corpus_path: PathBuf,

    /// Directory uploads are staged in while their text is extracted.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Where chunks are stored and searched.
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value = "pinecone")]
    pub store: StoreBackend,

    /// Pinecone index host, e.g. `my-index-abc123.svc.pinecone.io`.
    #[arg(long, env = "PINECONE_INDEX_HOST")]
    pub pinecone_host: Option<String>,

    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pub pinecone_api_key: Option<String>,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Generative model name.
    #[arg(long, env = "LLM_MODEL", default_value = contract_review_core::model::DEFAULT_MODEL)]
    pub model: String,

    /// Generative Language API base URL.
    #[arg(
        long,
        env = "LLM_BASE_URL",
        default_value = contract_review_core::model::DEFAULT_BASE_URL
    )]
    pub model_base_url: String,

    #[arg(long, env = "CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,

    /// Chunks retrieved from each namespace per comparison.
    #[arg(long, env = "TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Pause between retrieval and the model call.
    #[arg(long, env = "MODEL_DELAY_SECS", default_value_t = 10)]
    pub model_delay_secs: u64,

    /// Deadline for a single model call.
    #[arg(long, env = "MODEL_TIMEOUT_SECS", default_value_t = 120)]
    pub model_timeout_secs: u64,

    /// Largest accepted upload body, in megabytes.
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 25)]
    pub max_upload_mb: usize,

    /// Answer 404 for document ids with nothing indexed.
    #[arg(
        long,
        env = "REQUIRE_INDEXED_DOCUMENT",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub require_indexed_document: bool,
}

impl ServeArgs {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            ..ChunkingConfig::default()
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn comparison(&self) -> ComparisonOptions {
        ComparisonOptions {
            top_k: self.top_k,
            model_timeout: Duration::from_secs(self.model_timeout_secs),
            throttle: Throttle::new(Duration::from_secs(self.model_delay_secs)),
            require_indexed_document: self.require_indexed_document,
        }
    }
}
