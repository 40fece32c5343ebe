//! Fieldwork: progress and consistency engine for territory tracking
//!
//! Fieldwork provides:
//! - **Policy**: classifies units as countable/completed and picks their
//!   display state from the congregation's household-type options
//! - **Batch mutator**: bulk create/update/delete split under the store's
//!   per-batch operation ceiling and committed concurrently
//! - **Map maintenance**: reset, floor reshaping and recounts built on the
//!   batch mutator
//! - **Projector**: per-address and per-territory progress aggregation
//!
//! Live subscription management lives in `fieldwork-listeners`; a store
//! backend (e.g. `fieldwork-memory`) plugs in through [`DocumentStore`].
//!
//! # Quick Start
//!
//! ```ignore
//! use fieldwork::prelude::*;
//!
//! let policy = Policy::new("Alice", options, None, "", "administrator", None);
//! let mutator = BatchMutator::new(store.clone());
//! let maintenance = MapMaintenance::new(mutator, "c1");
//! let progress = maintenance.recount("m1", &policy).await?;
//! ```

pub mod batch;
pub mod maintenance;
pub mod policy;
pub mod prelude;

// Re-export core types
pub use fieldwork_core::{
    config::{EngineConfig, DEFAULT_EXPIRY_HOURS, DEFAULT_MAX_TRIES, MAX_BATCH_SIZE},
    error::{FieldworkError, Result},
    paths,
    query::{Direction, Filter, FilterOp, OrderBy, Query},
    traits::{DocumentStore, Snapshot, SnapshotCallback, Subscription, UnitClassifier, WriteBatch},
    types::{
        Address, AddressProgress, AddressType, DocRef, Document, DocumentData,
        HouseholdTypeOption, LinkSession, LinkType, Role, Territory, Unit, UnitStatus,
    },
};

// Re-export the projector
pub use fieldwork_projector::{AddressSummary, AggregationProjector, FloorUnits, TerritorySummary};

// Re-export main types from this crate
pub use batch::{partition, BatchAction, BatchMutator, BatchReport};
pub use maintenance::MapMaintenance;
pub use policy::{load_options, Policy};
