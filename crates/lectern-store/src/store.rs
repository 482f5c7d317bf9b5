//! Storage trait seams.
//!
//! The synthesis engine never talks to a database or object store
//! directly; it hands results to these traits. Production backends live
//! with the hosting service, the in-memory implementations here back
//! the tests and single-process deployments.

use crate::error::StoreError;
use crate::record::DocumentRecord;
use std::future::Future;
use uuid::Uuid;

/// Content-addressed-ish byte storage: audio streams and mark files.
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns a stable URL for it.
    fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Retrieves the bytes behind a URL previously returned by `put`.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

/// Per-document audio state storage.
pub trait DocumentStore: Send + Sync {
    fn fetch(&self, id: Uuid) -> impl Future<Output = Result<DocumentRecord, StoreError>> + Send;

    /// Replaces the stored record wholesale. The record must already
    /// exist; creation goes through `insert`.
    fn update(
        &self,
        record: DocumentRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn insert(
        &self,
        record: DocumentRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
