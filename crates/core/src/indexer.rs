use crate::chunking::TextSplitter;
use crate::error::IndexingError;
use crate::extractor::{extract_text_with, LopdfExtractor, PdfExtractor};
use crate::models::{DocumentId, Namespace};
use crate::registry::IssuedDocuments;
use crate::stores::NamespaceStore;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Extracts, chunks and stores uploaded documents, one namespace per document.
pub struct DocumentIndexer<S>
where
    S: NamespaceStore,
{
    store: S,
    extractor: Arc<dyn PdfExtractor + Send + Sync>,
    splitter: TextSplitter,
    staging_dir: PathBuf,
    issued: IssuedDocuments,
}

impl<S> DocumentIndexer<S>
where
    S: NamespaceStore,
{
    pub fn new(store: S, splitter: TextSplitter, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            extractor: Arc::new(LopdfExtractor),
            splitter,
            staging_dir: staging_dir.into(),
            issued: IssuedDocuments::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PdfExtractor + Send + Sync>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Records every successfully indexed id in `issued`, including documents
    /// that produced no chunks.
    pub fn with_issued_documents(mut self, issued: IssuedDocuments) -> Self {
        self.issued = issued;
        self
    }

    /// Indexes an uploaded PDF under `document_id`. The staged copy is removed
    /// once extraction finishes, whatever the outcome.
    pub async fn index(
        &self,
        bytes: &[u8],
        document_id: DocumentId,
    ) -> Result<DocumentId, IndexingError> {
        let extractor = Arc::clone(&self.extractor);
        let staging_dir = self.staging_dir.clone();
        let upload = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || {
            stage_and_extract(extractor.as_ref(), &staging_dir, &upload, document_id)
        })
        .await
        .map_err(|err| IndexingError::Task(err.to_string()))??;

        let namespace = Namespace::Document(document_id);
        let records = namespace.records(self.splitter.split(&text));
        if !records.is_empty() {
            self.store.upsert(&namespace, &records).await?;
        }
        self.issued.insert(document_id);

        info!(
            %document_id,
            namespace = %namespace,
            chunk_count = records.len(),
            "document indexed"
        );
        Ok(document_id)
    }
}

fn stage_and_extract(
    extractor: &(dyn PdfExtractor + Send + Sync),
    staging_dir: &Path,
    bytes: &[u8],
    document_id: DocumentId,
) -> Result<String, IndexingError> {
    fs::create_dir_all(staging_dir)?;

    let mut staged = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile_in(staging_dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;
    debug!(%document_id, path = %staged.path().display(), bytes = bytes.len(), "staged upload");

    Ok(extract_text_with(extractor, staged.path())?)
}
