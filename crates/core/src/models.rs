use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const CORPUS_NAMESPACE: &str = "legal-standards";
pub const CORPUS_RECORD_PREFIX: &str = "legal";
pub const NO_MATCHES_MESSAGE: &str =
    "No relevant matches found in either document or legal corpus.";

/// Identifier minted for every uploaded document. Only used as a namespace key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Partition of the external store. The corpus and each document live in
/// their own namespace; a document id can never serialize to the corpus key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Corpus,
    Document(DocumentId),
}

impl Namespace {
    pub fn key(&self) -> String {
        match self {
            Namespace::Corpus => CORPUS_NAMESPACE.to_string(),
            Namespace::Document(id) => format!("document-{id}"),
        }
    }

    /// Prefix used for record ids written into this namespace.
    pub fn record_prefix(&self) -> String {
        match self {
            Namespace::Corpus => CORPUS_RECORD_PREFIX.to_string(),
            Namespace::Document(id) => id.to_string(),
        }
    }

    /// Turns an ordered chunk sequence into records with `{prefix}-{index}` ids.
    pub fn records<I, S>(&self, chunks: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefix = self.record_prefix();
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| Record {
                id: format!("{prefix}-{index}"),
                text: text.into(),
            })
            .collect()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreHit {
    pub id: String,
    pub text: String,
    pub score: f64,
}

/// Outcome of the startup corpus load, reported through the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorpusStatus {
    Loaded { chunks: usize },
    Missing,
    Empty,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOutcome {
    NoMatches,
    Answered {
        summary: String,
        document_hits: usize,
        legal_hits: usize,
    },
}

impl ComparisonOutcome {
    pub fn into_text(self) -> String {
        match self {
            ComparisonOutcome::NoMatches => NO_MATCHES_MESSAGE.to_string(),
            ComparisonOutcome::Answered { summary, .. } => summary,
        }
    }
}
