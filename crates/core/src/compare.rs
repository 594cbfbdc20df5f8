use crate::error::ComparisonError;
use crate::model::LanguageModel;
use crate::models::{ComparisonOutcome, DocumentId, Namespace, StoreHit};
use crate::prompt::build_comparison_prompt;
use crate::registry::IssuedDocuments;
use crate::stores::NamespaceStore;
use crate::throttle::Throttle;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ComparisonOptions {
    pub top_k: usize,
    pub model_timeout: Duration,
    pub throttle: Throttle,
    /// Reject ids that this process never issued and whose namespace holds
    /// no records, instead of treating them as an empty retrieval.
    pub require_indexed_document: bool,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            throttle: Throttle::default(),
            require_indexed_document: true,
        }
    }
}

/// Retrieves matching chunks from a document and the legal corpus, then asks
/// the language model for a compliance summary.
pub struct Comparator<S, M>
where
    S: NamespaceStore,
    M: LanguageModel,
{
    store: S,
    model: M,
    options: ComparisonOptions,
    issued: IssuedDocuments,
}

impl<S, M> Comparator<S, M>
where
    S: NamespaceStore,
    M: LanguageModel,
{
    pub fn new(store: S, model: M, options: ComparisonOptions) -> Self {
        Self {
            store,
            model,
            options,
            issued: IssuedDocuments::new(),
        }
    }

    /// Shares the set of ids issued by the indexer, so a freshly uploaded
    /// document is never reported missing.
    pub fn with_issued_documents(mut self, issued: IssuedDocuments) -> Self {
        self.issued = issued;
        self
    }

    pub async fn compare(
        &self,
        document_id: DocumentId,
        query: &str,
    ) -> Result<ComparisonOutcome, ComparisonError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ComparisonError::InvalidQuery("query is empty".to_string()));
        }

        let document = Namespace::Document(document_id);
        if self.options.require_indexed_document && !self.is_known(document_id).await? {
            return Err(ComparisonError::NotFound(document_id));
        }

        let top_k = self.options.top_k;
        let (document_hits, legal_hits) = tokio::try_join!(
            self.store.search(&document, query, top_k),
            self.store.search(&Namespace::Corpus, query, top_k)
        )?;
        let document_hits = hit_texts(document_hits, top_k);
        let legal_hits = hit_texts(legal_hits, top_k);

        debug!(
            %document_id,
            document_hits = document_hits.len(),
            legal_hits = legal_hits.len(),
            "retrieval complete"
        );

        if document_hits.is_empty() && legal_hits.is_empty() {
            info!(%document_id, "no relevant matches, skipping model call");
            return Ok(ComparisonOutcome::NoMatches);
        }

        self.options.throttle.pause().await;

        let prompt = build_comparison_prompt(&document_hits, &legal_hits, query);
        let summary = tokio::time::timeout(self.options.model_timeout, self.model.invoke(&prompt))
            .await
            .map_err(|_| ComparisonError::Timeout(self.options.model_timeout))??;

        info!(%document_id, summary_chars = summary.len(), "comparison complete");

        Ok(ComparisonOutcome::Answered {
            summary,
            document_hits: document_hits.len(),
            legal_hits: legal_hits.len(),
        })
    }

    async fn is_known(&self, document_id: DocumentId) -> Result<bool, ComparisonError> {
        if self.issued.contains(&document_id) {
            return Ok(true);
        }
        let count = self.store.record_count(&Namespace::Document(document_id)).await?;
        Ok(count > 0)
    }
}

fn hit_texts(hits: Vec<StoreHit>, top_k: usize) -> Vec<String> {
    hits.into_iter().take(top_k).map(|hit| hit.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, StoreError};
    use crate::models::Record;
    use crate::stores::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingModel {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("The contract broadly aligns.".to_string())
        }
    }

    struct SlowModel;

    #[async_trait]
    impl LanguageModel for SlowModel {
        async fn invoke(&self, _prompt: &str) -> Result<String, ModelError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(String::new())
        }
    }

    /// Claims every namespace is populated but never finds anything.
    struct EmptyHitsStore;

    #[async_trait]
    impl NamespaceStore for EmptyHitsStore {
        async fn upsert(
            &self,
            _namespace: &Namespace,
            _records: &[Record],
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn search(
            &self,
            _namespace: &Namespace,
            _query: &str,
            _top_k: usize,
        ) -> Result<Vec<StoreHit>, StoreError> {
            Ok(Vec::new())
        }

        async fn record_count(&self, _namespace: &Namespace) -> Result<usize, StoreError> {
            Ok(1)
        }
    }

    struct FailingStore;

    #[async_trait]
    impl NamespaceStore for FailingStore {
        async fn upsert(
            &self,
            _namespace: &Namespace,
            _records: &[Record],
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn search(
            &self,
            _namespace: &Namespace,
            _query: &str,
            _top_k: usize,
        ) -> Result<Vec<StoreHit>, StoreError> {
            Err(StoreError::Request("search unavailable".to_string()))
        }

        async fn record_count(&self, _namespace: &Namespace) -> Result<usize, StoreError> {
            Ok(1)
        }
    }

    fn options() -> ComparisonOptions {
        ComparisonOptions {
            throttle: Throttle::none(),
            ..ComparisonOptions::default()
        }
    }

    async fn seeded_store(
        document_id: DocumentId,
        document: &[&str],
        corpus: &[&str],
    ) -> InMemoryStore {
        let store = InMemoryStore::new();
        let namespace = Namespace::Document(document_id);
        store
            .upsert(&namespace, &namespace.records(document.iter().copied()))
            .await
            .unwrap();
        store
            .upsert(&Namespace::Corpus, &Namespace::Corpus.records(corpus.iter().copied()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn no_hits_short_circuits_without_model_call() {
        let model = Arc::new(RecordingModel::default());
        let comparator = Comparator::new(EmptyHitsStore, model.clone(), options());

        let outcome = comparator
            .compare(DocumentId::new(), "termination clause")
            .await
            .unwrap();

        assert_eq!(outcome, ComparisonOutcome::NoMatches);
        assert_eq!(
            outcome.into_text(),
            "No relevant matches found in either document or legal corpus."
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hits_are_capped_by_what_is_stored() {
        let id = DocumentId::new();
        let store = seeded_store(
            id,
            &["Either party may terminate with 7 days notice."],
            &[
                "Termination requires reasonable notice.",
                "Wages must be paid monthly.",
                "Non-compete clauses are void.",
                "Disputes go to arbitration.",
            ],
        )
        .await;
        let model = Arc::new(RecordingModel::default());
        let comparator = Comparator::new(store, model.clone(), options());

        let outcome = comparator.compare(id, "termination notice").await.unwrap();

        match outcome {
            ComparisonOutcome::Answered {
                summary,
                document_hits,
                legal_hits,
            } => {
                assert_eq!(summary, "The contract broadly aligns.");
                assert_eq!(document_hits, 1);
                assert_eq!(legal_hits, 3);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("[1] Either party may terminate with 7 days notice."));
    }

    #[tokio::test]
    async fn unknown_document_is_not_found_by_default() {
        let store = seeded_store(DocumentId::new(), &["Some clause."], &["A standard."]).await;
        let model = Arc::new(RecordingModel::default());
        let comparator = Comparator::new(store, model.clone(), options());

        let missing = DocumentId::new();
        let result = comparator.compare(missing, "anything").await;

        assert!(matches!(result, Err(ComparisonError::NotFound(id)) if id == missing));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_document_can_be_treated_as_empty() {
        let store =
            seeded_store(DocumentId::new(), &["Some clause."], &["A standard about notice."]).await;
        let model = Arc::new(RecordingModel::default());
        let comparator = Comparator::new(
            store,
            model.clone(),
            ComparisonOptions {
                require_indexed_document: false,
                ..options()
            },
        );

        let outcome = comparator.compare(DocumentId::new(), "notice").await.unwrap();
        assert!(matches!(
            outcome,
            ComparisonOutcome::Answered {
                document_hits: 0,
                legal_hits: 1,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out() {
        let id = DocumentId::new();
        let store = seeded_store(id, &["Clause."], &["Standard."]).await;
        let comparator = Comparator::new(
            store,
            SlowModel,
            ComparisonOptions {
                model_timeout: Duration::from_secs(30),
                ..options()
            },
        );

        let result = comparator.compare(id, "clause").await;
        assert!(matches!(
            result,
            Err(ComparisonError::Timeout(limit)) if limit == Duration::from_secs(30)
        ));
    }

    #[tokio::test]
    async fn store_failure_is_a_retrieval_error() {
        let comparator = Comparator::new(FailingStore, RecordingModel::default(), options());
        let result = comparator.compare(DocumentId::new(), "clause").await;
        assert!(matches!(result, Err(ComparisonError::Retrieval(_))));
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let comparator = Comparator::new(EmptyHitsStore, RecordingModel::default(), options());
        let result = comparator.compare(DocumentId::new(), "   ").await;
        assert!(matches!(result, Err(ComparisonError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn issued_document_without_chunks_still_gets_legal_hits() {
        let store =
            seeded_store(DocumentId::new(), &[], &["Notice must be given in writing."]).await;
        let issued = IssuedDocuments::new();
        let blank = DocumentId::new();
        issued.insert(blank);

        let model = Arc::new(RecordingModel::default());
        let comparator =
            Comparator::new(store, model.clone(), options()).with_issued_documents(issued);

        let outcome = comparator.compare(blank, "notice").await.unwrap();
        assert!(matches!(
            outcome,
            ComparisonOutcome::Answered {
                document_hits: 0,
                legal_hits: 1,
                ..
            }
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
