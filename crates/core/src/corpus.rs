use crate::chunking::TextSplitter;
use crate::extractor::{extract_text_with, PdfExtractor};
use crate::models::{CorpusStatus, Namespace};
use crate::stores::NamespaceStore;
use std::path::Path;
use tracing::{error, info, warn};

/// Loads the reference legal corpus into its reserved namespace.
///
/// Never fails: a missing, blank or unreadable corpus leaves the namespace
/// untouched and is reported through the returned status.
pub async fn load_corpus<S>(
    path: &Path,
    extractor: &dyn PdfExtractor,
    splitter: &TextSplitter,
    store: &S,
) -> CorpusStatus
where
    S: NamespaceStore,
{
    if !path.exists() {
        warn!(
            path = %path.display(),
            "legal corpus file not found, comparisons will have no legal standards"
        );
        return CorpusStatus::Missing;
    }

    let text = match extract_text_with(extractor, path) {
        Ok(text) => text,
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to read legal corpus");
            return CorpusStatus::Failed {
                reason: err.to_string(),
            };
        }
    };

    if text.is_empty() {
        warn!(path = %path.display(), "legal corpus has no extractable text");
        return CorpusStatus::Empty;
    }

    let namespace = Namespace::Corpus;
    let records = namespace.records(splitter.split(&text));
    if records.is_empty() {
        warn!(path = %path.display(), "legal corpus produced no chunks");
        return CorpusStatus::Empty;
    }

    match store.upsert(&namespace, &records).await {
        Ok(()) => {
            info!(
                path = %path.display(),
                namespace = %namespace,
                chunk_count = records.len(),
                "legal corpus initialized"
            );
            CorpusStatus::Loaded {
                chunks: records.len(),
            }
        }
        Err(err) => {
            error!(namespace = %namespace, error = %err, "failed to store legal corpus");
            CorpusStatus::Failed {
                reason: err.to_string(),
            }
        }
    }
}
