pub mod chunking;
pub mod compare;
pub mod corpus;
pub mod error;
pub mod extractor;
pub mod indexer;
pub mod model;
pub mod models;
pub mod prompt;
pub mod registry;
pub mod stores;
pub mod throttle;

pub use chunking::{
    chunk_text, ChunkingConfig, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
pub use compare::{Comparator, ComparisonOptions, DEFAULT_MODEL_TIMEOUT, DEFAULT_TOP_K};
pub use corpus::load_corpus;
pub use error::{ComparisonError, ExtractionError, IndexingError, ModelError, StoreError};
pub use extractor::{extract_text, join_pages, LopdfExtractor, PageText, PdfExtractor};
pub use indexer::DocumentIndexer;
pub use model::{GeminiModel, LanguageModel};
pub use models::{
    ComparisonOutcome, CorpusStatus, DocumentId, Namespace, Record, StoreHit, NO_MATCHES_MESSAGE,
};
pub use prompt::build_comparison_prompt;
pub use registry::IssuedDocuments;
pub use stores::{InMemoryStore, NamespaceStore, PineconeStore};
pub use throttle::Throttle;
