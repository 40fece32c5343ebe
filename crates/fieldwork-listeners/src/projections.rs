use chrono::{DateTime, Utc};
use fieldwork_core::types::{LinkSession, Territory, Unit};
use fieldwork_projector::AddressSummary;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable view of everything the live listeners currently hold
///
/// A new value is published after every applied snapshot and every teardown;
/// readers never observe a partially rebuilt state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projections {
    /// Increments on every publish
    pub version: u64,
    pub congregation: Option<String>,
    pub territory: Option<String>,
    /// Territories of the congregation, ordered by code
    pub territories: Vec<Territory>,
    /// One summary per address of the current territory, ordered by name.
    /// Floors are only populated for addresses with a live unit listener.
    pub addresses: Vec<AddressSummary>,
    /// Link sessions of the current territory
    pub links: Vec<LinkSession>,
    /// Units per map id, for every map with a live unit listener
    pub units: BTreeMap<String, Vec<Unit>>,
    /// Map ids whose unit listener is live and shown
    pub visible: BTreeSet<String>,
    /// Overall completion of the current territory
    pub progress: u32,
}

impl Projections {
    pub fn address(&self, map_id: &str) -> Option<&AddressSummary> {
        self.addresses.iter().find(|a| a.map_id() == map_id)
    }

    pub fn units(&self, map_id: &str) -> &[Unit] {
        self.units.get(map_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_visible(&self, map_id: &str) -> bool {
        self.visible.contains(map_id)
    }

    /// Links that have not expired at `now`.
    pub fn active_links(&self, now: DateTime<Utc>) -> impl Iterator<Item = &LinkSession> {
        self.links.iter().filter(move |link| !link.is_expired(now))
    }

    /// No listener data held.
    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
            && self.addresses.is_empty()
            && self.links.is_empty()
            && self.units.is_empty()
    }
}
