//! In-memory storage backends.

use crate::error::StoreError;
use crate::record::DocumentRecord;
use crate::store::{BlobStore, DocumentStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Blob storage in a process-local map. URLs use a `mem://` scheme so a
/// misrouted URL fails loudly instead of hitting the network.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Blob>>,
}

#[derive(Debug, Clone)]
struct Blob {
    content_type: String,
    bytes: Vec<u8>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn url_for(key: &str) -> String {
        format!("mem://{key}")
    }

    /// The content type recorded at `put` time, for assertions.
    pub async fn content_type(&self, url: &str) -> Option<String> {
        let blobs = self.blobs.read().await;
        blobs.get(url).map(|b| b.content_type.clone())
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = Self::url_for(key);
        let mut blobs = self.blobs.write().await;
        blobs.insert(
            url.clone(),
            Blob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(url)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let blobs = self.blobs.read().await;
        blobs
            .get(url)
            .map(|b| b.bytes.clone())
            .ok_or_else(|| StoreError::BlobNotFound(url.to_string()))
    }
}

/// Document records in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    records: RwLock<HashMap<Uuid, DocumentRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, id: Uuid) -> Result<DocumentRecord, StoreError> {
        let records = self.records.read().await;
        records
            .get(&id)
            .cloned()
            .ok_or(StoreError::DocumentNotFound(id))
    }

    async fn update(&self, record: DocumentRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if !records.contains_key(&record.id) {
            return Err(StoreError::DocumentNotFound(record.id));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn insert(&self, record: DocumentRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(record.id, record);
        Ok(())
    }
}
