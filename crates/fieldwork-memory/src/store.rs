use async_trait::async_trait;
use fieldwork_core::{
    error::{FieldworkError, Result},
    traits::{DocumentStore, Snapshot, SnapshotCallback, Subscription, WriteBatch},
    types::{DocRef, Document, DocumentData},
    Query,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// When subscriber snapshots are handed to their callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Synchronously, right after the subscribe call or commit that produced
    /// them.
    #[default]
    Immediate,
    /// Queued until [`MemoryStore::deliver_pending`]. Queued snapshots are
    /// still delivered after their subscription was dropped.
    Manual,
}

struct Subscriber {
    query: Query,
    callback: SnapshotCallback,
}

type Pending = (SnapshotCallback, Snapshot);

#[derive(Default)]
pub(crate) struct State {
    pub(crate) documents: BTreeMap<String, DocumentData>,
    subscribers: BTreeMap<u64, Subscriber>,
    pending: VecDeque<Pending>,
    failing_paths: BTreeSet<String>,
    unavailable: bool,
    delivery: Delivery,
    next_subscriber: u64,
    commits: u64,
}

impl State {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(FieldworkError::StoreUnavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn run(&self, query: &Query) -> Vec<Document> {
        let prefix = format!("{}/", query.collection);
        let mut docs: Vec<Document> = self
            .documents
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            // direct children only, not documents of nested collections
            .filter(|(path, _)| !path[prefix.len()..].contains('/'))
            .map(|(path, data)| Document::new(DocRef::new(path.as_str()), data.clone()))
            .filter(|doc| query.matches(doc))
            .collect();
        docs.sort_by(|a, b| query.compare(a, b));
        docs
    }

    /// Queue or return snapshots for every subscriber on a touched collection.
    fn notify(&mut self, touched: &BTreeSet<String>) -> Vec<Pending> {
        let deliveries: Vec<Pending> = self
            .subscribers
            .values()
            .filter(|sub| touched.contains(&sub.query.collection))
            .map(|sub| (sub.callback.clone(), Snapshot::new(self.run(&sub.query))))
            .collect();
        self.route(deliveries)
    }

    fn route(&mut self, deliveries: Vec<Pending>) -> Vec<Pending> {
        match self.delivery {
            Delivery::Immediate => deliveries,
            Delivery::Manual => {
                self.pending.extend(deliveries);
                Vec::new()
            }
        }
    }
}

/// Fire snapshot callbacks. Must be called without the state lock held.
fn dispatch(deliveries: Vec<Pending>) {
    for (callback, snapshot) in deliveries {
        callback(snapshot);
    }
}

/// In-memory [`DocumentStore`]
///
/// Cloning yields another handle to the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub(crate) state: Arc<Mutex<State>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delivery(self, delivery: Delivery) -> Self {
        self.set_delivery(delivery);
        self
    }

    pub fn set_delivery(&self, delivery: Delivery) {
        self.state.lock().delivery = delivery;
    }

    /// Seed a document directly. Subscribers are not notified.
    pub fn insert(&self, path: impl Into<String>, data: DocumentData) {
        self.state.lock().documents.insert(path.into(), data);
    }

    pub fn document(&self, path: &str) -> Option<DocumentData> {
        self.state.lock().documents.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Successfully committed batches.
    pub fn commit_count(&self) -> u64 {
        self.state.lock().commits
    }

    pub fn pending_deliveries(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Deliver every queued snapshot in order. Returns how many were
    /// delivered.
    pub fn deliver_pending(&self) -> usize {
        let pending: Vec<Pending> = self.state.lock().pending.drain(..).collect();
        let count = pending.len();
        dispatch(pending);
        count
    }

    /// Reject every batch that writes `path`.
    pub fn fail_batches_touching(&self, path: impl Into<String>) {
        self.state.lock().failing_paths.insert(path.into());
    }

    pub fn clear_failures(&self) {
        self.state.lock().failing_paths.clear();
    }

    /// Take the store offline (every call fails with `StoreUnavailable`) or
    /// bring it back.
    pub fn set_available(&self, available: bool) {
        self.state.lock().unavailable = !available;
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryStore")
            .field("documents", &state.documents.len())
            .field("subscribers", &state.subscribers.len())
            .field("delivery", &state.delivery)
            .finish()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.run(query))
    }

    async fn get(&self, doc: &DocRef) -> Result<Option<Document>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state
            .documents
            .get(doc.path())
            .map(|data| Document::new(doc.clone(), data.clone())))
    }

    fn subscribe(&self, query: Query, on_snapshot: SnapshotCallback) -> Result<Subscription> {
        let (id, deliveries) = {
            let mut state = self.state.lock();
            state.check_available()?;
            let id = state.next_subscriber;
            state.next_subscriber += 1;
            let initial = Snapshot::new(state.run(&query));
            state.subscribers.insert(
                id,
                Subscriber {
                    query,
                    callback: on_snapshot.clone(),
                },
            );
            (id, state.route(vec![(on_snapshot, initial)]))
        };
        tracing::debug!(subscriber = id, "Subscribed");
        dispatch(deliveries);

        let state = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().subscribers.remove(&id);
            }
        }))
    }

    fn batch(&self) -> Box<dyn WriteBatch> {
        Box::new(MemoryBatch {
            store: self.clone(),
            ops: Vec::new(),
        })
    }

    fn new_doc_ref(&self, collection: &str) -> DocRef {
        let state = self.state.lock();
        loop {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            let doc = DocRef::child(collection, &format!("auto{:06}", n));
            if !state.documents.contains_key(doc.path()) {
                return doc;
            }
        }
    }
}

enum BatchOp {
    Set { path: String, data: DocumentData },
    Update { path: String, data: DocumentData },
    Delete { path: String },
}

impl BatchOp {
    fn path(&self) -> &str {
        match self {
            BatchOp::Set { path, .. } | BatchOp::Update { path, .. } | BatchOp::Delete { path } => {
                path
            }
        }
    }
}

/// Write batch for [`MemoryStore`]
pub struct MemoryBatch {
    store: MemoryStore,
    ops: Vec<BatchOp>,
}

#[async_trait]
impl WriteBatch for MemoryBatch {
    fn set(&mut self, doc: &DocRef, data: DocumentData) {
        self.ops.push(BatchOp::Set {
            path: doc.path().to_string(),
            data,
        });
    }

    fn update(&mut self, doc: &DocRef, data: DocumentData) {
        self.ops.push(BatchOp::Update {
            path: doc.path().to_string(),
            data,
        });
    }

    fn delete(&mut self, doc: &DocRef) {
        self.ops.push(BatchOp::Delete {
            path: doc.path().to_string(),
        });
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryBatch { store, ops } = *self;

        let deliveries = {
            let mut state = store.state.lock();
            state.check_available()?;

            if let Some(path) = ops
                .iter()
                .map(BatchOp::path)
                .find(|path| state.failing_paths.contains(*path))
            {
                return Err(FieldworkError::StoreUnavailable(format!(
                    "commit rejected: {}",
                    path
                )));
            }

            // Validate the whole batch before applying any of it.
            let mut exists: HashMap<&str, bool> = HashMap::new();
            for op in &ops {
                let path = op.path();
                let present = exists
                    .get(path)
                    .copied()
                    .unwrap_or_else(|| state.documents.contains_key(path));
                match op {
                    BatchOp::Set { .. } => {
                        exists.insert(path, true);
                    }
                    BatchOp::Update { .. } if !present => {
                        return Err(FieldworkError::NotFound(format!(
                            "update of missing document {}",
                            path
                        )));
                    }
                    BatchOp::Update { .. } => {}
                    BatchOp::Delete { .. } => {
                        exists.insert(path, false);
                    }
                }
            }

            let mut touched = BTreeSet::new();
            for op in ops {
                touched.insert(DocRef::new(op.path()).collection().to_string());
                match op {
                    BatchOp::Set { path, data } => {
                        state.documents.insert(path, data);
                    }
                    BatchOp::Update { path, data } => {
                        if let Some(doc) = state.documents.get_mut(&path) {
                            doc.extend(data);
                        }
                    }
                    BatchOp::Delete { path } => {
                        state.documents.remove(&path);
                    }
                }
            }
            state.commits += 1;
            state.notify(&touched)
        };

        dispatch(deliveries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldwork_core::{Direction, Filter, FilterOp};
    use serde_json::json;

    fn data(value: serde_json::Value) -> DocumentData {
        match value {
            serde_json::Value::Object(map) => map,
            _ => DocumentData::new(),
        }
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("c/units/a", data(json!({"map": "m1", "floor": 2, "sequence": 1})));
        store.insert("c/units/b", data(json!({"map": "m1", "floor": 1, "sequence": 2})));
        store.insert("c/units/c", data(json!({"map": "m2", "floor": 1, "sequence": 1})));
        store.insert("c/units/a/notes/x", data(json!({"map": "m1"})));
        store
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id()).collect()
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = seeded();
        let query = Query::collection("c/units")
            .where_eq("map", "m1")
            .order_by("floor", Direction::Ascending);
        let docs = store.query(&query).await.unwrap();
        // nested sub-collection documents are not children of c/units
        assert_eq!(ids(&docs), vec!["b", "a"]);

        let query = Query::collection("c/units").filter(Filter::new("floor", FilterOp::Ge, 2));
        assert_eq!(ids(&store.query(&query).await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_missing_fails_whole_batch() {
        let store = seeded();
        let mut batch = store.batch();
        batch.delete(&DocRef::new("c/units/a"));
        batch.update(&DocRef::new("c/units/zzz"), data(json!({"floor": 9})));
        assert_eq!(batch.len(), 2);

        let err = batch.commit().await.unwrap_err();
        assert!(matches!(err, FieldworkError::NotFound(_)));
        assert!(store.document("c/units/a").is_some());
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = seeded();
        let mut batch = store.batch();
        batch.update(&DocRef::new("c/units/a"), data(json!({"floor": 7, "note": "x"})));
        batch.commit().await.unwrap();

        let doc = store.document("c/units/a").unwrap();
        assert_eq!(doc["floor"], json!(7));
        assert_eq!(doc["note"], json!("x"));
        assert_eq!(doc["map"], json!("m1"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_snapshots() {
        let store = seeded();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = store
            .subscribe(
                Query::collection("c/units").where_eq("map", "m2"),
                Arc::new(move |snapshot: Snapshot| sink.lock().push(snapshot.len())),
            )
            .unwrap();
        assert_eq!(*seen.lock(), vec![1]);

        let mut batch = store.batch();
        batch.set(&DocRef::new("c/units/d"), data(json!({"map": "m2"})));
        batch.commit().await.unwrap();
        assert_eq!(*seen.lock(), vec![1, 2]);

        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
        let mut batch = store.batch();
        batch.delete(&DocRef::new("c/units/d"));
        batch.commit().await.unwrap();
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_manual_delivery_outlives_subscription() {
        let store = seeded().with_delivery(Delivery::Manual);
        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();
        let sub = store
            .subscribe(
                Query::collection("c/units"),
                Arc::new(move |_: Snapshot| *sink.lock() += 1),
            )
            .unwrap();
        assert_eq!(*seen.lock(), 0);
        assert_eq!(store.pending_deliveries(), 1);

        drop(sub);
        assert_eq!(store.deliver_pending(), 1);
        assert_eq!(*seen.lock(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = seeded();
        store.fail_batches_touching("c/units/b");

        let mut batch = store.batch();
        batch.delete(&DocRef::new("c/units/a"));
        batch.delete(&DocRef::new("c/units/b"));
        assert!(matches!(
            batch.commit().await,
            Err(FieldworkError::StoreUnavailable(_))
        ));
        assert_eq!(store.len(), 4);

        store.clear_failures();
        store.set_available(false);
        assert!(store.query(&Query::collection("c/units")).await.is_err());
        assert!(store
            .subscribe(Query::collection("c/units"), Arc::new(|_: Snapshot| {}))
            .is_err());
        store.set_available(true);
        assert_eq!(store.query(&Query::collection("c/units")).await.unwrap().len(), 3);
    }

    #[test]
    fn test_new_doc_ref_skips_existing() {
        let store = MemoryStore::new();
        store.insert("c/units/auto000000", DocumentData::new());
        let doc = store.new_doc_ref("c/units");
        assert_eq!(doc.collection(), "c/units");
        assert_ne!(doc.path(), "c/units/auto000000");
        assert_ne!(store.new_doc_ref("c/units"), doc);
    }
}
