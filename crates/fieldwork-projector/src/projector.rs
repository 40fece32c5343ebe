use crate::summary::{AddressSummary, FloorUnits, TerritorySummary};
use fieldwork_core::traits::UnitClassifier;
use fieldwork_core::types::{Address, AddressProgress, Territory, Unit, UnitStatus};
use std::collections::BTreeMap;

/// Stateless progress projector
///
/// Every call rebuilds its output from the full input; nothing is diffed
/// against a previous projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationProjector;

impl AggregationProjector {
    pub fn new() -> Self {
        Self
    }

    /// Group `units` by floor for display.
    ///
    /// Units that belong to a different map are skipped. Floors run top-down
    /// for multi-story addresses and bottom-up otherwise; units within a
    /// floor are ordered by sequence, then number.
    pub fn address(&self, address: &Address, units: &[Unit]) -> AddressSummary {
        let mut by_floor: BTreeMap<i64, Vec<Unit>> = BTreeMap::new();
        let mut max_unit_number_len = 0;

        for unit in units {
            if !unit.map.is_empty() && unit.map != address.id {
                continue;
            }
            max_unit_number_len = max_unit_number_len.max(unit.number.chars().count());
            by_floor.entry(unit.floor).or_default().push(unit.clone());
        }

        let mut floors: Vec<FloorUnits> = by_floor
            .into_iter()
            .map(|(floor, mut units)| {
                units.sort_by(|a, b| {
                    a.sequence
                        .cmp(&b.sequence)
                        .then_with(|| a.number.cmp(&b.number))
                });
                FloorUnits { floor, units }
            })
            .collect();

        if address.address_type.floors_descending() {
            floors.reverse();
        }

        AddressSummary {
            address: address.clone(),
            floors,
            max_unit_number_len,
        }
    }

    /// Overall territory completion:
    /// `round(sum(aggregate) / (100 * count) * 100)`, `0` with no addresses.
    pub fn territory_progress<'a, I>(&self, aggregates: I) -> u32
    where
        I: IntoIterator<Item = &'a AddressProgress>,
    {
        let mut count = 0usize;
        let mut sum = 0.0f64;
        for progress in aggregates {
            count += 1;
            sum += progress.aggregate;
        }
        if count == 0 {
            return 0;
        }
        (sum / (100.0 * count as f64) * 100.0).round() as u32
    }

    pub fn territory(&self, territory: &Territory, addresses: Vec<AddressSummary>) -> TerritorySummary {
        let progress = self.territory_progress(addresses.iter().map(|a| &a.address.progress));
        TerritorySummary {
            territory: territory.clone(),
            addresses,
            progress,
        }
    }

    /// Recompute an address's progress primitives from its units.
    ///
    /// Only countable units are tallied: `done` counts Done units, `nothome`
    /// counts NotHome units that still need another try, `notdone` counts
    /// every unit that is not completed.
    pub fn tally<C>(&self, units: &[Unit], classifier: &C) -> AddressProgress
    where
        C: UnitClassifier + ?Sized,
    {
        let mut progress = AddressProgress::default();
        for unit in units.iter().filter(|u| classifier.is_countable(u)) {
            let completed = classifier.is_completed(unit);
            match unit.status {
                UnitStatus::Done => progress.done += 1,
                UnitStatus::NotHome if !completed => progress.nothome += 1,
                _ => {}
            }
            if !completed {
                progress.notdone += 1;
            }
        }
        progress.aggregate = f64::from(classifier.aggregate_progress(units));
        tracing::debug!(
            units = units.len(),
            aggregate = progress.aggregate,
            "Tallied address progress"
        );
        progress
    }
}
