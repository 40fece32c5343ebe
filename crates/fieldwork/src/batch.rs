//! Chunked bulk mutations under the store's per-batch operation ceiling.
//!
//! A [`BatchMutator`] resolves its target set once, splits the resulting
//! operations into partitions of at most `max_batch_size - 1` operations and
//! commits every partition concurrently. Each partition is atomic on its own;
//! the run as a whole is not. A failed partition does not roll back the ones
//! that already committed.
//!
//! # Example
//!
//! ```ignore
//! use fieldwork::prelude::*;
//!
//! let mutator = BatchMutator::new(store.clone());
//! let query = Query::collection(paths::addresses("c1")).where_eq("map", "m1");
//! let report = mutator.delete_where(&query).await?;
//! println!("deleted {} units in {} partitions", report.documents, report.partitions);
//! ```

use fieldwork_core::config::{EngineConfig, MAX_BATCH_SIZE};
use fieldwork_core::error::{FieldworkError, Result};
use fieldwork_core::observe;
use fieldwork_core::traits::{DocumentStore, WriteBatch};
use fieldwork_core::types::{DocRef, DocumentData};
use fieldwork_core::Query;
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Kind of bulk mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchAction::Create => "create",
            BatchAction::Update => "update",
            BatchAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Outcome of a fully committed bulk mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub action: BatchAction,
    /// Documents written or removed
    pub documents: usize,
    /// Partitions committed
    pub partitions: usize,
}

/// A buffered operation in a partition.
enum BatchOp {
    Set { doc: DocRef, data: DocumentData },
    Update { doc: DocRef, data: DocumentData },
    Delete { doc: DocRef },
}

impl BatchOp {
    fn apply(self, batch: &mut dyn WriteBatch) {
        match self {
            BatchOp::Set { doc, data } => batch.set(&doc, data),
            BatchOp::Update { doc, data } => batch.update(&doc, data),
            BatchOp::Delete { doc } => batch.delete(&doc),
        }
    }
}

/// Split `items` into consecutive partitions of at most `capacity` items.
///
/// A partition is sealed as soon as it holds `capacity` items; a trailing
/// non-empty partition is kept. Order is preserved across and within
/// partitions. No items yields no partitions.
pub fn partition<T>(items: Vec<T>, capacity: usize) -> Vec<Vec<T>> {
    let capacity = capacity.max(1);
    let mut partitions = Vec::with_capacity(items.len().div_ceil(capacity));
    let mut current = Vec::with_capacity(capacity.min(items.len()));

    for item in items {
        current.push(item);
        if current.len() == capacity {
            partitions.push(std::mem::replace(&mut current, Vec::with_capacity(capacity)));
        }
    }
    if !current.is_empty() {
        partitions.push(current);
    }
    partitions
}

/// Bulk create/update/delete against a [`DocumentStore`]
pub struct BatchMutator {
    store: Arc<dyn DocumentStore>,
    max_batch_size: usize,
}

impl BatchMutator {
    /// Mutator using the default [`MAX_BATCH_SIZE`] ceiling.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Mutator using the ceiling from `config`.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            max_batch_size: config.max_batch_size,
        })
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Operations per partition. One slot below the ceiling is left free.
    pub fn partition_capacity(&self) -> Result<usize> {
        if self.max_batch_size < 2 {
            return Err(FieldworkError::Config(format!(
                "max_batch_size must be at least 2, got {}",
                self.max_batch_size
            )));
        }
        Ok(self.max_batch_size - 1)
    }

    /// Delete every document matching `query`.
    pub async fn delete_where(&self, query: &Query) -> Result<BatchReport> {
        self.partition_capacity()?;
        let docs = self.store.query(query).await?;
        let ops = docs
            .into_iter()
            .map(|doc| BatchOp::Delete { doc: doc.reference })
            .collect();
        self.run(BatchAction::Delete, ops).await
    }

    /// Merge `payload` into every document matching `query`.
    pub async fn update_where(&self, query: &Query, payload: DocumentData) -> Result<BatchReport> {
        self.partition_capacity()?;
        let docs = self.store.query(query).await?;
        let ops = docs
            .into_iter()
            .map(|doc| BatchOp::Update {
                doc: doc.reference,
                data: payload.clone(),
            })
            .collect();
        self.run(BatchAction::Update, ops).await
    }

    /// Merge `payload` into each of `docs`.
    pub async fn update_docs(&self, docs: Vec<DocRef>, payload: DocumentData) -> Result<BatchReport> {
        let ops = docs
            .into_iter()
            .map(|doc| BatchOp::Update {
                doc,
                data: payload.clone(),
            })
            .collect();
        self.run(BatchAction::Update, ops).await
    }

    /// Create one new document in `collection` per payload.
    pub async fn create_all(
        &self,
        collection: &str,
        payloads: Vec<DocumentData>,
    ) -> Result<BatchReport> {
        let ops = payloads
            .into_iter()
            .map(|data| BatchOp::Set {
                doc: self.store.new_doc_ref(collection),
                data,
            })
            .collect();
        self.run(BatchAction::Create, ops).await
    }

    async fn run(&self, action: BatchAction, ops: Vec<BatchOp>) -> Result<BatchReport> {
        let capacity = self.partition_capacity()?;
        let documents = ops.len();
        if documents == 0 {
            tracing::debug!(%action, "No documents matched, nothing to commit");
            return Ok(BatchReport {
                action,
                documents: 0,
                partitions: 0,
            });
        }

        let start = Instant::now();
        let partitions = partition(ops, capacity);
        let total = partitions.len();

        let commits = partitions.into_iter().enumerate().map(|(index, ops)| {
            let mut batch = self.store.batch();
            for op in ops {
                op.apply(batch.as_mut());
            }
            async move { (index, batch.commit().await) }
        });
        let results = join_all(commits).await;

        let mut committed = 0;
        let mut first_failure: Option<(usize, FieldworkError)> = None;
        for (index, result) in results {
            match result {
                Ok(()) => committed += 1,
                Err(e) => {
                    tracing::warn!(%action, partition = index, error = %e, "Batch partition failed");
                    // join_all yields in input order, so the first error seen
                    // has the lowest partition index.
                    if first_failure.is_none() {
                        first_failure = Some((index, e));
                    }
                }
            }
        }

        observe::record_batch(start.elapsed(), total, first_failure.is_none());

        if let Some((index, err)) = first_failure {
            if committed == 0 {
                return Err(err);
            }
            return Err(FieldworkError::PartialBatchFailure {
                partition: index,
                partitions: total,
                committed,
                message: err.to_string(),
            });
        }

        tracing::info!(
            %action,
            documents,
            partitions = total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch committed"
        );

        Ok(BatchReport {
            action,
            documents,
            partitions: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes<T>(partitions: &[Vec<T>]) -> Vec<usize> {
        partitions.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_partition_sizes() {
        // ceiling 3 leaves room for 2 ops per partition
        assert_eq!(sizes(&partition((0..5).collect(), 2)), vec![2, 2, 1]);
        assert_eq!(sizes(&partition((0..4).collect(), 2)), vec![2, 2]);
        assert_eq!(sizes(&partition((0..1).collect(), 2)), vec![1]);
        assert!(partition(Vec::<u8>::new(), 2).is_empty());
    }

    #[test]
    fn test_partition_at_default_ceiling() {
        let capacity = MAX_BATCH_SIZE - 1;
        assert_eq!(sizes(&partition(vec![(); 499], capacity)), vec![499]);
        assert_eq!(sizes(&partition(vec![(); 500], capacity)), vec![499, 1]);
        assert_eq!(sizes(&partition(vec![(); 1000], capacity)), vec![499, 499, 2]);
    }

    #[test]
    fn test_partition_preserves_order() {
        let flat: Vec<i32> = partition((0..7).collect(), 3).into_iter().flatten().collect();
        assert_eq!(flat, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_batch_action_display() {
        assert_eq!(BatchAction::Delete.to_string(), "delete");
        assert_eq!(BatchAction::Create.to_string(), "create");
    }
}
