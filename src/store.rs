//! In-memory store for completed extraction results.

use crate::schema::ExtractionResult;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// A persisted extraction keyed by its generated document id.
#[derive(Debug, Clone, Serialize)]
pub struct StoredDocument {
    pub id: String,
    /// External identifier of the source (Drive file id or upload name).
    pub file_id: String,
    /// SHA-256 of the extracted text.
    pub content_hash: String,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

/// Thread-safe document store shared across handlers.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    inner: Arc<RwLock<HashMap<String, StoredDocument>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a result under a fresh document id and return the id.
    pub fn insert(&self, file_id: &str, result: ExtractionResult) -> String {
        let id = format!("doc_{}", Uuid::new_v4().simple());
        let content_hash = {
            let mut hasher = Sha256::new();
            hasher.update(result.text.as_bytes());
            format!("{:x}", hasher.finalize())
        };

        let document = StoredDocument {
            id: id.clone(),
            file_id: file_id.to_string(),
            content_hash,
            result,
        };

        self.inner.write().unwrap().insert(id.clone(), document);
        tracing::debug!("stored document {}", id);
        id
    }

    /// Fetch a stored document by id (returns a clone).
    pub fn get(&self, id: &str) -> Option<StoredDocument> {
        self.inner.read().unwrap().get(id).cloned()
    }
}
