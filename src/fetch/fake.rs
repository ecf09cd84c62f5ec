use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::DisclosureSource;

/// In-memory source that records every document request it sees.
#[derive(Default)]
pub(crate) struct FakeSource {
    archive: Option<Vec<u8>>,
    documents: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_archive(mut self, bytes: Vec<u8>) -> Self {
        self.archive = Some(bytes);
        self
    }

    pub(crate) fn with_document(mut self, doc_id: &str, bytes: &[u8]) -> Self {
        self.documents.insert(doc_id.to_string(), bytes.to_vec());
        self
    }

    /// `(year, doc_id)` pairs in request order.
    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DisclosureSource for FakeSource {
    async fn fetch_archive(&self, year: &str) -> Result<Vec<u8>> {
        self.archive
            .clone()
            .ok_or_else(|| anyhow!("connection refused fetching {} archive", year))
    }

    async fn fetch_document(&self, year: &str, doc_id: &str) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((year.to_string(), doc_id.to_string()));
        self.documents
            .get(doc_id)
            .cloned()
            .ok_or_else(|| anyhow!("connection reset fetching {}", doc_id))
    }
}
