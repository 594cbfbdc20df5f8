//! In-process [`NamespaceStore`] for local runs and tests.
//!
//! Records live in a `BTreeMap` per namespace behind a `RwLock`. Each record
//! keeps a unit-length bag-of-words vector computed when it is upserted, so a
//! search only vectorizes the query and ranks by dot product.

use super::NamespaceStore;
use crate::error::StoreError;
use crate::models::{Namespace, Record, StoreHit};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

const TERM_BUCKETS: usize = 512;

struct StoredRecord {
    text: String,
    terms: Vec<f32>,
}

#[derive(Default)]
pub struct InMemoryStore {
    namespaces: RwLock<HashMap<String, BTreeMap<String, StoredRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a namespace ordered by id.
    pub fn records(&self, namespace: &Namespace) -> Result<Vec<Record>, StoreError> {
        let namespaces = self.namespaces.read().map_err(poisoned)?;
        Ok(namespaces
            .get(&namespace.key())
            .map(|records| {
                records
                    .iter()
                    .map(|(id, stored)| Record {
                        id: id.clone(),
                        text: stored.text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Request("in-memory store lock poisoned".to_string())
}

/// Case-folded word counts hashed into `TERM_BUCKETS`, scaled to unit length.
/// Text without any word yields the zero vector.
fn term_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0f32; TERM_BUCKETS];
    for word in text
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        let mut hasher = DefaultHasher::new();
        word.to_lowercase().hash(&mut hasher);
        vector[(hasher.finish() % TERM_BUCKETS as u64) as usize] += 1.0;
    }

    let norm = vector.iter().map(|weight| weight * weight).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|weight| *weight /= norm);
    }
    vector
}

fn dot(left: &[f32], right: &[f32]) -> f64 {
    let product: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    f64::from(product)
}

#[async_trait]
impl NamespaceStore for InMemoryStore {
    async fn upsert(&self, namespace: &Namespace, records: &[Record]) -> Result<(), StoreError> {
        let stored: Vec<(String, StoredRecord)> = records
            .iter()
            .map(|record| {
                let terms = term_vector(&record.text);
                (
                    record.id.clone(),
                    StoredRecord {
                        text: record.text.clone(),
                        terms,
                    },
                )
            })
            .collect();

        let mut namespaces = self.namespaces.write().map_err(poisoned)?;
        namespaces.entry(namespace.key()).or_default().extend(stored);
        Ok(())
    }

    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<StoreHit>, StoreError> {
        let query_terms = term_vector(query);
        let namespaces = self.namespaces.read().map_err(poisoned)?;
        let Some(records) = namespaces.get(&namespace.key()) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<StoreHit> = records
            .iter()
            .map(|(id, stored)| StoreHit {
                id: id.clone(),
                text: stored.text.clone(),
                score: dot(&query_terms, &stored.terms),
            })
            .collect();

        hits.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then_with(|| left.id.cmp(&right.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn record_count(&self, namespace: &Namespace) -> Result<usize, StoreError> {
        let namespaces = self.namespaces.read().map_err(poisoned)?;
        Ok(namespaces
            .get(&namespace.key())
            .map(BTreeMap::len)
            .unwrap_or(0))
    }
}
