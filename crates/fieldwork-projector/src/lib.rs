//! Projector: progress aggregation
//!
//! Folds the units of an address into a display-ready summary and combines
//! address aggregates into a territory percentage.
//!
//! Key points:
//! - Address aggregates are taken from the address document, not recomputed
//! - Floors are ordered per address type, units by visitation sequence
//! - `tally` recomputes progress from units when a recount is requested

pub mod projector;
pub mod summary;

pub use projector::AggregationProjector;
pub use summary::{AddressSummary, FloorUnits, TerritorySummary};
