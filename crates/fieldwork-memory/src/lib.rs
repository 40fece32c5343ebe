//! In-memory document store
//!
//! Implements the `fieldwork-core` store traits over an ordered map of
//! documents keyed by path. Used by the CLI (backed by a JSON fixture file)
//! and by tests.
//!
//! Features:
//! - Equality, membership and range filters plus orderings
//! - Atomic write batches; updating a missing document fails the batch
//! - Full-result snapshots pushed to matching subscribers after each commit
//! - Manual delivery mode that queues snapshots until asked, for reproducing
//!   late deliveries
//! - Failure injection per document path or for the whole store
//! - JSON fixture load/save

mod fixture;
mod store;

pub use store::{Delivery, MemoryBatch, MemoryStore};
