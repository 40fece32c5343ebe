//! # Fieldwork Listeners
//!
//! Live-subscription lifecycle for the admin view, built on the
//! `fieldwork-core` store traits.
//!
//! The registry provides:
//! - Per-category listeners (map, address, link, territory) scoped to the
//!   current congregation and territory
//! - Bulk teardown by category when the scope changes
//! - Idempotent address listeners: reopening a live map only toggles it
//! - Wholesale projection rebuilds published as `Arc<Projections>` over a
//!   `tokio::sync::watch` channel
//! - Detection of snapshots that arrive after their listener was closed
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldwork_listeners::{Category, ListenerRegistry};
//!
//! let registry = ListenerRegistry::new(store.clone());
//! registry.switch_congregation("c1")?;
//! registry.switch_territory("t1")?;
//! registry.open(Category::Address, "m1")?;
//!
//! let view = registry.snapshot();
//! println!("territory progress: {}%", view.progress);
//! ```

pub mod category;
pub mod error;
pub mod projections;
pub mod registry;

pub use category::{Category, ListenerPhase, OpenOutcome};
pub use error::{ListenerError, Result};
pub use projections::Projections;
pub use registry::ListenerRegistry;
