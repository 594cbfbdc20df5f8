pub mod memory;
pub mod pinecone;

pub use memory::InMemoryStore;
pub use pinecone::PineconeStore;

use crate::error::StoreError;
use crate::models::{Namespace, Record, StoreHit};
use async_trait::async_trait;
use std::sync::Arc;

/// Namespaced text store that embeds and ranks records on its own.
#[async_trait]
pub trait NamespaceStore: Send + Sync {
    /// Inserts or overwrites records by id.
    async fn upsert(&self, namespace: &Namespace, records: &[Record]) -> Result<(), StoreError>;

    /// Up to `top_k` hits, most relevant first. Unknown namespaces yield no hits.
    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<StoreHit>, StoreError>;

    /// Number of records stored under `namespace`, 0 when it does not exist.
    async fn record_count(&self, namespace: &Namespace) -> Result<usize, StoreError>;
}

#[async_trait]
impl<T> NamespaceStore for Arc<T>
where
    T: NamespaceStore + ?Sized,
{
    async fn upsert(&self, namespace: &Namespace, records: &[Record]) -> Result<(), StoreError> {
        (**self).upsert(namespace, records).await
    }

    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<StoreHit>, StoreError> {
        (**self).search(namespace, query, top_k).await
    }

    async fn record_count(&self, namespace: &Namespace) -> Result<usize, StoreError> {
        (**self).record_count(namespace).await
    }
}
