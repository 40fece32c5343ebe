//! Fieldwork Prelude
//!
//! ```
//! use fieldwork::prelude::*;
//! ```

// Core types
pub use crate::{FieldworkError, Result};

// Config
pub use crate::{EngineConfig, DEFAULT_EXPIRY_HOURS, DEFAULT_MAX_TRIES, MAX_BATCH_SIZE};

// Store traits and queries
pub use crate::{
    paths, Direction, DocumentStore, Filter, FilterOp, Query, Snapshot, Subscription,
    UnitClassifier, WriteBatch,
};

// Data model
pub use crate::{
    Address, AddressProgress, AddressType, DocRef, Document, DocumentData, HouseholdTypeOption,
    LinkSession, LinkType, Role, Territory, Unit, UnitStatus,
};

// Engine
pub use crate::{
    AddressSummary, AggregationProjector, BatchAction, BatchMutator, BatchReport, MapMaintenance,
    Policy, TerritorySummary,
};

// Re-export common external deps
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
