use super::NamespaceStore;
use crate::error::StoreError;
use crate::models::{Namespace, Record, StoreHit};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

const API_VERSION: &str = "2025-01";
const BACKEND: &str = "pinecone";
/// Integrated-embedding indexes accept at most this many records per upsert.
pub const MAX_UPSERT_BATCH: usize = 96;

/// Client for a Pinecone index with integrated embedding. Records carry a
/// single `text` field that the index embeds server side.
pub struct PineconeStore {
    client: Client,
    host: Url,
    api_key: String,
}

impl PineconeStore {
    pub fn new(host: &str, api_key: impl Into<String>) -> Result<Self, StoreError> {
        let host = host.trim().trim_end_matches('/');
        let host = if host.contains("://") {
            Url::parse(host)?
        } else {
            Url::parse(&format!("https://{host}"))?
        };

        Ok(Self {
            client: Client::new(),
            host,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.host.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn upsert_batch(&self, namespace: &str, records: &[Record]) -> Result<(), StoreError> {
        let mut body = String::new();
        for record in records {
            body.push_str(&serde_json::to_string(&json!({
                "_id": record.id,
                "text": record.text,
            }))?);
            body.push('\n');
        }

        let url = self.endpoint(&format!("records/namespaces/{namespace}/upsert"))?;
        let response = self
            .authorized(self.client.post(url))
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        Ok(())
    }
}

async fn backend_error(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    StoreError::BackendResponse {
        backend: BACKEND.to_string(),
        details: format!("{status}: {body}"),
    }
}

pub(crate) fn parse_hits(parsed: &Value) -> Vec<StoreHit> {
    parsed
        .pointer("/result/hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .map(|hit| StoreHit {
                    id: hit
                        .pointer("/_id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    text: hit
                        .pointer("/fields/text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    score: hit.pointer("/_score").and_then(Value::as_f64).unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_record_count(parsed: &Value, namespace: &str) -> usize {
    parsed
        .get("namespaces")
        .and_then(|namespaces| namespaces.get(namespace))
        .and_then(|stats| stats.get("vectorCount"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize
}

#[async_trait]
impl NamespaceStore for PineconeStore {
    async fn upsert(&self, namespace: &Namespace, records: &[Record]) -> Result<(), StoreError> {
        let key = namespace.key();
        for batch in records.chunks(MAX_UPSERT_BATCH) {
            self.upsert_batch(&key, batch).await?;
        }
        debug!(namespace = %key, records = records.len(), "pinecone upsert complete");
        Ok(())
    }

    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<StoreHit>, StoreError> {
        let key = namespace.key();
        let url = self.endpoint(&format!("records/namespaces/{key}/search"))?;
        let response = self
            .authorized(self.client.post(url))
            .json(&json!({
                "query": {
                    "inputs": { "text": query },
                    "top_k": top_k,
                },
                "fields": ["text"],
            }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(namespace = %key, "namespace does not exist yet");
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        let parsed: Value = response.json().await?;
        let mut hits = parse_hits(&parsed);
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn record_count(&self, namespace: &Namespace) -> Result<usize, StoreError> {
        let response = self
            .authorized(self.client.post(self.endpoint("describe_index_stats")?))
            .json(&json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        let parsed: Value = response.json().await?;
        Ok(parse_record_count(&parsed, &namespace.key()))
    }
}
