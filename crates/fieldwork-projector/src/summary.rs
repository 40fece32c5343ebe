use fieldwork_core::types::{Address, Territory, Unit};
use serde::Serialize;

/// Units on one floor, in visitation order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorUnits {
    pub floor: i64,
    pub units: Vec<Unit>,
}

/// Display-ready projection of one address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressSummary {
    pub address: Address,
    pub floors: Vec<FloorUnits>,
    /// Longest unit number, used to pad unit cells to a common width.
    pub max_unit_number_len: usize,
}

impl AddressSummary {
    pub fn map_id(&self) -> &str {
        &self.address.id
    }

    pub fn aggregate(&self) -> f64 {
        self.address.progress.aggregate
    }

    pub fn done(&self) -> u64 {
        self.address.progress.done
    }

    pub fn notdone(&self) -> u64 {
        self.address.progress.notdone
    }

    pub fn nothome(&self) -> u64 {
        self.address.progress.nothome
    }

    pub fn unit_count(&self) -> usize {
        self.floors.iter().map(|f| f.units.len()).sum()
    }

    /// Unit number left-padded with zeros to the address's display width.
    pub fn padded_number(&self, unit: &Unit) -> String {
        format!("{:0>width$}", unit.number, width = self.max_unit_number_len)
    }
}

/// Projection of a territory and its addresses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerritorySummary {
    pub territory: Territory,
    pub addresses: Vec<AddressSummary>,
    /// Overall completion percentage
    pub progress: u32,
}
