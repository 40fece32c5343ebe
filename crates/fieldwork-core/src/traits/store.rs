use crate::error::Result;
use crate::query::Query;
use crate::types::{DocRef, Document, DocumentData};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Full result set of a subscribed query at one point in time
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

impl Snapshot {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Callback invoked with every snapshot of a subscription.
///
/// May be called from any thread, including the thread that opened the
/// subscription.
pub type SnapshotCallback = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// Handle to a live store subscription
///
/// The store callback is detached when the handle is unsubscribed or dropped.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle with nothing to detach.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Buffered writes committed atomically
///
/// Nothing is applied until [`commit`](Self::commit). Dropping an uncommitted
/// batch discards it.
#[async_trait]
pub trait WriteBatch: Send {
    /// Create or overwrite a document.
    fn set(&mut self, doc: &DocRef, data: DocumentData);

    /// Merge fields into an existing document. Committing fails if the
    /// document does not exist.
    fn update(&mut self, doc: &DocRef, data: DocumentData);

    fn delete(&mut self, doc: &DocRef);

    /// Number of buffered operations.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every buffered operation, or none of them.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Document store capability consumed by the engine
///
/// Provides:
/// - One-shot collection queries
/// - Snapshot subscriptions that push the full result set on every change
/// - Atomic write batches, capped by the backend's operation ceiling
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resolve a query once.
    async fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Read a single document.
    async fn get(&self, doc: &DocRef) -> Result<Option<Document>>;

    /// Subscribe to a query. Snapshots are delivered in the order the store
    /// produces them; the first one carries the current result set.
    fn subscribe(&self, query: Query, on_snapshot: SnapshotCallback) -> Result<Subscription>;

    /// Begin a write batch.
    fn batch(&self) -> Box<dyn WriteBatch>;

    /// Allocate a reference for a new document in `collection`.
    fn new_doc_ref(&self, collection: &str) -> DocRef;
}
