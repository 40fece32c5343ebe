//! Listener lifecycle against the in-memory store

use fieldwork_core::error::FieldworkError;
use fieldwork_core::traits::DocumentStore;
use fieldwork_core::types::{DocRef, DocumentData, UnitStatus};
use fieldwork_listeners::{Category, ListenerError, ListenerPhase, ListenerRegistry, OpenOutcome};
use fieldwork_memory::{Delivery, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;

fn fixture() -> MemoryStore {
    MemoryStore::from_json(json!({
        "congregations/c1/territories/t1": {"code": "T02", "name": "North"},
        "congregations/c1/territories/t2": {"code": "T01", "name": "South"},
        "congregations/c1/maps/m1": {"territory": "t1", "name": "B Block", "type": 4, "aggregates": {"value": 40}},
        "congregations/c1/maps/m2": {"territory": "t1", "name": "A Block", "type": 1, "aggregates": {"value": 80}},
        "congregations/c1/maps/m3": {"territory": "t2", "name": "C Block", "aggregates": {"value": 10}},
        "congregations/c1/addresses/u1": {"map": "m1", "floor": 1, "sequence": 0, "number": "01", "status": -1},
        "congregations/c1/addresses/u2": {"map": "m1", "floor": 2, "sequence": 0, "number": "01", "status": 1},
        "congregations/c1/addresses/u3": {"map": "m2", "floor": 1, "sequence": 0, "number": "7", "status": -1},
        "congregations/c2/territories/t9": {"code": "T09", "name": "Elsewhere"},
        "links/l1": {"congregation": "c1", "territory": "t1", "map": "m1", "type": 1, "endTimestamp": 1},
        "links/l2": {"congregation": "c2", "territory": "t1", "map": "m1", "type": 1, "endTimestamp": 1},
    }))
    .unwrap()
}

fn registry(store: &MemoryStore) -> ListenerRegistry {
    ListenerRegistry::new(Arc::new(store.clone()))
}

fn object(value: Value) -> DocumentData {
    match value {
        Value::Object(map) => map,
        _ => DocumentData::new(),
    }
}

#[test]
fn test_switch_congregation_opens_territories() {
    let store = fixture();
    let registry = registry(&store);

    registry.switch_congregation("c1").unwrap();
    assert_eq!(registry.phase(Category::Territory), ListenerPhase::Active);

    let view = registry.snapshot();
    let codes: Vec<&str> = view.territories.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes, vec!["T01", "T02"]);
    assert_eq!(view.congregation.as_deref(), Some("c1"));
}

#[test]
fn test_switch_territory_builds_projections() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();

    let view = registry.snapshot();
    let names: Vec<&str> = view.addresses.iter().map(|a| a.address.name.as_str()).collect();
    assert_eq!(names, vec!["A Block", "B Block"]);
    assert_eq!(view.progress, 60);
    assert_eq!(view.links.len(), 1);
    assert_eq!(view.links[0].id, "l1");
    assert_eq!(view.territory.as_deref(), Some("t1"));
    assert_eq!(registry.live_subscriptions(), 3);
}

#[test]
fn test_address_open_twice_toggles_visibility() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();

    assert_eq!(registry.open(Category::Address, "m1").unwrap(), OpenOutcome::Subscribed);
    let subscribers = store.subscriber_count();
    assert!(registry.is_visible("m1"));

    assert_eq!(
        registry.open(Category::Address, "m1").unwrap(),
        OpenOutcome::Toggled { visible: false }
    );
    assert_eq!(store.subscriber_count(), subscribers);
    assert!(!registry.is_visible("m1"));
    assert!(!registry.snapshot().is_visible("m1"));
    // data stays loaded while hidden
    assert_eq!(registry.snapshot().units("m1").len(), 2);

    assert_eq!(
        registry.open(Category::Address, "m1").unwrap(),
        OpenOutcome::Toggled { visible: true }
    );
    assert_eq!(store.subscriber_count(), subscribers);
}

#[test]
fn test_address_units_grouped_by_floor() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();
    registry.open(Category::Address, "m1").unwrap();

    let view = registry.snapshot();
    let summary = view.address("m1").unwrap();
    // multi-story: top floor first
    let floors: Vec<i64> = summary.floors.iter().map(|f| f.floor).collect();
    assert_eq!(floors, vec![2, 1]);
    assert_eq!(view.address("m2").unwrap().unit_count(), 0);
}

#[test]
fn test_late_snapshot_after_teardown_is_discarded() {
    let store = fixture().with_delivery(Delivery::Manual);
    let registry = registry(&store).with_congregation("c1");

    registry.open(Category::Address, "m1").unwrap();
    assert_eq!(registry.phase(Category::Address), ListenerPhase::Subscribing);
    assert_eq!(store.pending_deliveries(), 1);

    registry.close_all(&[Category::Address]);
    assert_eq!(registry.phase(Category::Address), ListenerPhase::TornDown);
    assert_eq!(store.subscriber_count(), 0);

    // the initial snapshot was already in flight
    assert_eq!(store.deliver_pending(), 1);
    let view = registry.snapshot();
    assert!(view.units.is_empty());
    assert!(view.is_empty());
    assert_eq!(registry.phase(Category::Address), ListenerPhase::TornDown);
}

#[tokio::test]
async fn test_late_update_after_teardown_is_discarded() {
    let store = fixture().with_delivery(Delivery::Manual);
    let registry = registry(&store).with_congregation("c1");

    registry.open(Category::Address, "m1").unwrap();
    store.deliver_pending();
    assert_eq!(registry.phase(Category::Address), ListenerPhase::Active);
    assert_eq!(registry.snapshot().units("m1").len(), 2);

    let mut batch = store.batch();
    batch.delete(&DocRef::new("congregations/c1/addresses/u1"));
    batch.commit().await.unwrap();
    assert_eq!(store.pending_deliveries(), 1);

    registry.close_all(&[Category::Address]);
    store.deliver_pending();
    assert!(registry.snapshot().units.is_empty());
}

#[test]
fn test_reopen_after_teardown_starts_fresh() {
    let store = fixture();
    let registry = registry(&store).with_congregation("c1");

    registry.open(Category::Address, "m1").unwrap();
    registry.close_all(&[Category::Address]);
    assert!(!registry.is_open(Category::Address, "m1"));

    assert_eq!(registry.open(Category::Address, "m1").unwrap(), OpenOutcome::Subscribed);
    assert!(registry.is_visible("m1"));
    assert_eq!(registry.phase(Category::Address), ListenerPhase::Active);
    assert_eq!(registry.snapshot().units("m1").len(), 2);
}

#[tokio::test]
async fn test_snapshots_replace_slice() {
    let store = fixture();
    let registry = registry(&store).with_congregation("c1");
    registry.open(Category::Address, "m1").unwrap();

    let mut batch = store.batch();
    batch.update(
        &DocRef::new("congregations/c1/addresses/u1"),
        object(json!({"status": 2, "nhcount": "1"})),
    );
    batch.delete(&DocRef::new("congregations/c1/addresses/u2"));
    batch.commit().await.unwrap();

    let view = registry.snapshot();
    let units = view.units("m1");
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].status, UnitStatus::NotHome);
    assert_eq!(units[0].nhcount, "1");
}

#[test]
fn test_switch_territory_clears_previous_scope() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();
    registry.open(Category::Address, "m1").unwrap();
    registry.open(Category::Address, "m2").unwrap();

    registry.switch_territory("t2").unwrap();
    assert!(!registry.is_open(Category::Address, "m1"));
    assert!(!registry.is_open(Category::Map, "t1"));
    assert!(registry.is_open(Category::Map, "t2"));
    assert_eq!(registry.phase(Category::Address), ListenerPhase::TornDown);

    let view = registry.snapshot();
    assert!(view.units.is_empty());
    assert!(view.links.is_empty());
    let names: Vec<&str> = view.addresses.iter().map(|a| a.address.name.as_str()).collect();
    assert_eq!(names, vec!["C Block"]);
    assert_eq!(view.progress, 10);
    // territory, map, link
    assert_eq!(store.subscriber_count(), 3);
}

#[test]
fn test_switch_congregation_clears_everything() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();
    registry.open(Category::Address, "m1").unwrap();

    registry.switch_congregation("c2").unwrap();
    let view = registry.snapshot();
    assert!(view.addresses.is_empty());
    assert!(view.units.is_empty());
    assert_eq!(view.territory, None);
    let codes: Vec<&str> = view.territories.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes, vec!["T09"]);
    assert_eq!(store.subscriber_count(), 1);
}

#[test]
fn test_single_scope_categories() {
    let store = fixture();
    let registry = registry(&store).with_congregation("c1");

    assert_eq!(registry.open(Category::Map, "t1").unwrap(), OpenOutcome::Subscribed);
    assert_eq!(registry.open(Category::Map, "t1").unwrap(), OpenOutcome::AlreadyOpen);
    assert_eq!(registry.open(Category::Map, "t2").unwrap(), OpenOutcome::Subscribed);
    assert!(!registry.is_open(Category::Map, "t1"));
    assert_eq!(store.subscriber_count(), 1);
    assert_eq!(registry.snapshot().addresses.len(), 1);
}

#[test]
fn test_map_open_for_other_territory_drops_old_scope() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();
    registry.open(Category::Address, "m1").unwrap();

    assert_eq!(registry.open(Category::Map, "t2").unwrap(), OpenOutcome::Subscribed);
    assert!(!registry.is_open(Category::Address, "m1"));
    assert!(!registry.is_open(Category::Link, "t1"));
    assert_eq!(registry.territory().as_deref(), Some("t2"));

    let view = registry.snapshot();
    assert_eq!(view.territory.as_deref(), Some("t2"));
    let names: Vec<&str> = view.addresses.iter().map(|a| a.address.name.as_str()).collect();
    assert_eq!(names, vec!["C Block"]);
    assert!(view.units.is_empty());
    assert!(view.links.is_empty());
    // territory list and the new map listener
    assert_eq!(store.subscriber_count(), 2);
}

#[test]
fn test_territory_open_for_other_congregation_rebinds() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();

    registry.open(Category::Territory, "c2").unwrap();
    assert_eq!(registry.congregation().as_deref(), Some("c2"));
    assert_eq!(registry.territory(), None);
    assert_eq!(registry.live_subscriptions(), 1);

    let view = registry.snapshot();
    let codes: Vec<&str> = view.territories.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes, vec!["T09"]);
    assert!(view.addresses.is_empty());
}

#[test]
fn test_close_single_address() {
    let store = fixture();
    let registry = registry(&store).with_congregation("c1");
    registry.open(Category::Address, "m1").unwrap();
    registry.open(Category::Address, "m2").unwrap();

    assert!(registry.close(Category::Address, "m1"));
    assert!(!registry.close(Category::Address, "m1"));
    let view = registry.snapshot();
    assert!(view.units.contains_key("m2"));
    assert!(!view.units.contains_key("m1"));
    assert_eq!(registry.phase(Category::Address), ListenerPhase::Active);
}

#[test]
fn test_requires_congregation() {
    let store = fixture();
    let registry = registry(&store);

    assert!(matches!(
        registry.open(Category::Map, "t1"),
        Err(ListenerError::NoCongregation(Category::Map))
    ));
    assert!(registry.switch_territory("t1").is_err());
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn test_subscribe_failure_leaves_no_entry() {
    let store = fixture();
    let registry = registry(&store).with_congregation("c1");
    store.set_available(false);

    let result = registry.open(Category::Address, "m1");
    assert!(matches!(
        result,
        Err(ListenerError::Fieldwork(FieldworkError::StoreUnavailable(_)))
    ));
    assert!(!registry.is_open(Category::Address, "m1"));
    assert_eq!(registry.phase(Category::Address), ListenerPhase::Inactive);
}

#[test]
fn test_drop_unsubscribes() {
    let store = fixture();
    let registry = registry(&store);
    registry.switch_congregation("c1").unwrap();
    registry.switch_territory("t1").unwrap();
    registry.open(Category::Address, "m1").unwrap();
    assert_eq!(store.subscriber_count(), 4);

    drop(registry);
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn test_watch_receives_rebuilds() {
    let store = fixture();
    let registry = registry(&store).with_congregation("c1");
    let mut rx = registry.watch();
    assert_eq!(rx.borrow_and_update().version, 0);

    registry.open(Category::Address, "m1").unwrap();
    assert!(rx.has_changed().unwrap());
    let view = rx.borrow_and_update().clone();
    assert_eq!(view.units("m1").len(), 2);

    let mut batch = store.batch();
    batch.delete(&DocRef::new("congregations/c1/addresses/u2"));
    batch.commit().await.unwrap();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().units("m1").len(), 1);
}
