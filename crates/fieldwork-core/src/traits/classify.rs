use crate::types::Unit;

/// Classifies units for completion math
///
/// Implementations must not fail on malformed units: anything they cannot
/// interpret is neither countable nor completed.
pub trait UnitClassifier: Send + Sync {
    /// Whether the unit takes part in completion math.
    fn is_countable(&self, unit: &Unit) -> bool;

    /// Whether the unit needs no further visits.
    fn is_completed(&self, unit: &Unit) -> bool;

    /// Percentage of countable units that are completed, rounded half away
    /// from zero. `0` when nothing is countable.
    fn aggregate_progress(&self, units: &[Unit]) -> u32 {
        let mut countable = 0u64;
        let mut completed = 0u64;
        for unit in units.iter().filter(|u| self.is_countable(u)) {
            countable += 1;
            if self.is_completed(unit) {
                completed += 1;
            }
        }
        if countable == 0 {
            return 0;
        }
        (completed as f64 / countable as f64 * 100.0).round() as u32
    }
}
