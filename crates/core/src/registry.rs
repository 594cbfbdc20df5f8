use crate::models::DocumentId;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Ids handed out by this process. A listed id is a known document even when
/// its namespace holds no records, or the store has not caught up yet.
#[derive(Debug, Clone, Default)]
pub struct IssuedDocuments {
    ids: Arc<RwLock<HashSet<DocumentId>>>,
}

impl IssuedDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document_id: DocumentId) {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document_id);
    }

    pub fn contains(&self, document_id: &DocumentId) -> bool {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(document_id)
    }
}
