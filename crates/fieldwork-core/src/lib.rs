//! Fieldwork Core: traits and types for the territory progress engine
//!
//! This crate defines the shared abstractions used by every other fieldwork
//! crate:
//! - Data model: units, household-type options, addresses ("maps"),
//!   territories and link sessions, decoded defensively from store documents
//! - Document store: query, snapshot-subscribe and batched-write capability
//!   that backends implement
//! - Query model: filters and orderings evaluated the same way by every backend
//! - Configuration and the error taxonomy
//!
//! Nothing in here talks to a concrete store; see `fieldwork-memory` for the
//! in-memory backend.

pub mod config;
pub mod error;
pub mod observe;
pub mod paths;
pub mod query;
pub mod traits;
pub mod types;

pub use config::{EngineConfig, DEFAULT_EXPIRY_HOURS, DEFAULT_MAX_TRIES, MAX_BATCH_SIZE};
pub use error::{FieldworkError, Result};
pub use query::{Direction, Filter, FilterOp, OrderBy, Query};
pub use traits::{
    DocumentStore, Snapshot, SnapshotCallback, Subscription, UnitClassifier, WriteBatch,
};
pub use types::{
    Address, AddressProgress, AddressType, DocRef, Document, DocumentData, HouseholdTypeOption,
    LinkSession, LinkType, Role, Territory, Unit, UnitStatus,
};
