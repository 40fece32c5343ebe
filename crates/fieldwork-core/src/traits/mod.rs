pub mod classify;
pub mod store;

pub use classify::UnitClassifier;
pub use store::{DocumentStore, Snapshot, SnapshotCallback, Subscription, WriteBatch};
