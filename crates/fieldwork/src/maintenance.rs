//! Bulk map maintenance: resetting, reshaping and recounting a map's units.

use crate::batch::{BatchMutator, BatchReport};
use crate::policy::Policy;
use fieldwork_core::error::{FieldworkError, Result};
use fieldwork_core::types::{Address, AddressProgress, DocRef, DocumentData, Unit, UnitStatus};
use fieldwork_core::{paths, Direction, Query};
use fieldwork_projector::AggregationProjector;
use serde_json::{json, Value};

/// Not-home count written when units are reset.
const NHCOUNT_RESET: &str = "0";

/// Map-level bulk operations for one congregation
pub struct MapMaintenance {
    mutator: BatchMutator,
    congregation: String,
}

impl MapMaintenance {
    pub fn new(mutator: BatchMutator, congregation: impl Into<String>) -> Self {
        Self {
            mutator,
            congregation: congregation.into(),
        }
    }

    pub fn congregation(&self) -> &str {
        &self.congregation
    }

    /// Units of `map_id`, ordered by floor then sequence.
    pub fn units_query(&self, map_id: &str) -> Query {
        Query::collection(paths::addresses(&self.congregation))
            .where_eq("map", map_id)
            .order_by("floor", Direction::Ascending)
            .order_by("sequence", Direction::Ascending)
    }

    pub async fn units(&self, map_id: &str) -> Result<Vec<Unit>> {
        let docs = self.mutator.store().query(&self.units_query(map_id)).await?;
        Ok(docs
            .iter()
            .map(|doc| Unit::from_document(doc.id(), &doc.data))
            .collect())
    }

    pub async fn address(&self, map_id: &str) -> Result<Address> {
        let doc_ref = self.address_ref(map_id);
        match self.mutator.store().get(&doc_ref).await? {
            Some(doc) => Ok(Address::from_document(doc.id(), &doc.data)),
            None => Err(FieldworkError::NotFound(format!("address {}", doc_ref))),
        }
    }

    /// Put every Done or NotHome unit of `map_id` back to Default.
    ///
    /// Statuses are decoded per unit, so code strings and status names are
    /// reset along with numeric codes.
    pub async fn reset_map(&self, map_id: &str) -> Result<BatchReport> {
        // the ceiling is checked before the units are read
        self.mutator.partition_capacity()?;
        let docs = self.mutator.store().query(&self.units_query(map_id)).await?;
        let visited: Vec<DocRef> = docs
            .into_iter()
            .filter(|doc| {
                matches!(
                    UnitStatus::from_value(doc.data.get("status")),
                    UnitStatus::Done | UnitStatus::NotHome
                )
            })
            .map(|doc| doc.reference)
            .collect();

        let payload = object(json!({
            "status": UnitStatus::Default.code(),
            "nhcount": NHCOUNT_RESET,
        }));
        let report = self.mutator.update_docs(visited, payload).await?;
        tracing::info!(map = map_id, units = report.documents, "Reset map");
        Ok(report)
    }

    pub async fn delete_floor(&self, map_id: &str, floor: i64) -> Result<BatchReport> {
        let query = self.units_query(map_id).where_eq("floor", floor);
        let report = self.mutator.delete_where(&query).await?;
        tracing::info!(map = map_id, floor, units = report.documents, "Deleted floor");
        Ok(report)
    }

    /// Create one unit per entry of `numbers` on `floor`, sequenced in the
    /// given order and tagged with the policy's default household type.
    ///
    /// Fails with `InvalidState` if the floor already has units.
    pub async fn add_floor(
        &self,
        address: &Address,
        floor: i64,
        numbers: &[String],
        policy: &Policy,
    ) -> Result<BatchReport> {
        let existing = self
            .mutator
            .store()
            .query(&self.units_query(&address.id).where_eq("floor", floor))
            .await?;
        if !existing.is_empty() {
            return Err(FieldworkError::InvalidState(format!(
                "floor {} of {} already has {} units",
                floor,
                address.id,
                existing.len()
            )));
        }

        let types = policy.default_types();
        let payloads = numbers
            .iter()
            .enumerate()
            .map(|(sequence, number)| {
                let mut unit = Unit::new("", number.as_str())
                    .with_map(address.id.as_str())
                    .with_floor(floor)
                    .with_sequence(sequence as i64)
                    .with_types(types.iter().cloned())
                    .with_nhcount(NHCOUNT_RESET);
                unit.territory = address.territory.clone();
                unit.to_document()
            })
            .collect();

        let collection = paths::addresses(&self.congregation);
        let report = self.mutator.create_all(&collection, payloads).await?;
        tracing::info!(map = %address.id, floor, units = report.documents, "Added floor");
        Ok(report)
    }

    /// Recompute `map_id`'s progress from its units and store it on the
    /// address document.
    pub async fn recount(&self, map_id: &str, policy: &Policy) -> Result<AddressProgress> {
        // fails early with NotFound instead of on commit
        self.address(map_id).await?;

        let units = self.units(map_id).await?;
        let progress = AggregationProjector::new().tally(&units, policy);

        let mut payload = DocumentData::new();
        payload.insert("aggregates".to_string(), progress.to_value());
        let mut batch = self.mutator.store().batch();
        batch.update(&self.address_ref(map_id), payload);
        batch.commit().await?;

        tracing::info!(
            map = map_id,
            aggregate = progress.aggregate,
            done = progress.done,
            notdone = progress.notdone,
            nothome = progress.nothome,
            "Recounted map"
        );
        Ok(progress)
    }

    fn address_ref(&self, map_id: &str) -> DocRef {
        DocRef::child(&paths::maps(&self.congregation), map_id)
    }
}

fn object(value: Value) -> DocumentData {
    match value {
        Value::Object(map) => map,
        _ => DocumentData::new(),
    }
}
