//! Document store abstraction and the in-memory implementation.
//!
//! The store is the only shared mutable resource in the system. It is
//! passed explicitly (by reference or `Arc`), never reached as ambient
//! global state, so tests substitute their own instance per case. Uses
//! `HashMap` behind `std::sync::RwLock` for thread safety.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, UserSettings};

/// Passive value holder for documents and user settings. The pipeline never
/// writes here directly; it returns a Summary that the service layer
/// attaches via [`put`](DocumentStore::put). Re-summarization is
/// last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Document>>;

    /// Insert or replace by document id.
    async fn put(&self, doc: Document) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// All documents, upload time descending.
    async fn list(&self) -> Result<Vec<Document>>;

    async fn get_settings(&self) -> Result<UserSettings>;

    async fn update_settings(&self, settings: UserSettings) -> Result<()>;
}

/// In-memory store for single-process use and tests.
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    settings: RwLock<UserSettings>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            settings: RwLock::new(UserSettings::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let docs = self.docs.read().unwrap();
        Ok(docs.get(id).cloned())
    }

    async fn put(&self, doc: Document) -> Result<()> {
        let mut docs = self.docs.write().unwrap();
        docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut docs = self.docs.write().unwrap();
        docs.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let docs = self.docs.read().unwrap();
        let mut all: Vec<Document> = docs.values().cloned().collect();
        all.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(all)
    }

    async fn get_settings(&self) -> Result<UserSettings> {
        Ok(self.settings.read().unwrap().clone())
    }

    async fn update_settings(&self, settings: UserSettings) -> Result<()> {
        *self.settings.write().unwrap() = settings;
        Ok(())
    }
}
