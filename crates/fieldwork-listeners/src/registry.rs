//! Scoped live-subscription registry
//!
//! The registry owns every store subscription the admin view needs and keeps
//! them scoped to the current congregation and territory. Each snapshot
//! replaces its category's slice wholesale, after which the projections are
//! rebuilt and published as a fresh `Arc<Projections>`.
//!
//! Locking rules:
//! - The store is never called while the registry lock is held
//! - Teardown removes the entry (and with it the generation the callback was
//!   created for) under the lock, so a snapshot still in flight is recognised
//!   as stale and dropped
//! - Subscriptions are released after the lock is gone

use crate::category::{Category, ListenerPhase, OpenOutcome};
use crate::error::{ListenerError, Result};
use crate::projections::Projections;
use fieldwork_core::observe;
use fieldwork_core::traits::{DocumentStore, Snapshot, SnapshotCallback, Subscription};
use fieldwork_core::types::{Address, LinkSession, Territory, Unit};
use fieldwork_core::{paths, Direction, Query};
use fieldwork_projector::AggregationProjector;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use tokio::sync::watch;

type Key = (Category, String);

/// Categories whose listeners belong to the current territory
const TERRITORY_SCOPED: [Category; 3] = [Category::Map, Category::Address, Category::Link];

struct Entry {
    /// Token the entry's callback was created with
    generation: u64,
    /// `None` until the store call returns
    subscription: Option<Subscription>,
    /// Address listeners only
    visible: bool,
}

#[derive(Default)]
struct State {
    congregation: Option<String>,
    territory: Option<String>,
    entries: HashMap<Key, Entry>,
    phases: HashMap<Category, ListenerPhase>,
    next_generation: u64,
    version: u64,
    territories: Vec<Territory>,
    maps: Vec<Address>,
    links: Vec<LinkSession>,
    units: BTreeMap<String, Vec<Unit>>,
}

impl State {
    fn phase(&self, category: Category) -> ListenerPhase {
        self.phases.get(&category).copied().unwrap_or_default()
    }

    fn keys_of(&self, category: Category) -> Vec<Key> {
        self.entries
            .keys()
            .filter(|(c, _)| *c == category)
            .cloned()
            .collect()
    }

    fn clear_slice(&mut self, category: Category) {
        match category {
            Category::Territory => self.territories.clear(),
            Category::Map => self.maps.clear(),
            Category::Link => self.links.clear(),
            Category::Address => self.units.clear(),
        }
    }

    /// Remove every entry of `categories`, clear their slices and mark them
    /// torn down. Returns the subscriptions to release once unlocked.
    fn tear_down(&mut self, categories: &[Category]) -> Vec<Subscription> {
        let mut released = Vec::new();
        for &category in categories {
            for key in self.keys_of(category) {
                if let Some(entry) = self.entries.remove(&key) {
                    released.extend(entry.subscription);
                }
            }
            self.clear_slice(category);
            if self.phase(category) != ListenerPhase::Inactive {
                self.phases.insert(category, ListenerPhase::TornDown);
            }
        }
        released
    }

    /// Categories to tear down before opening `key` in a single-scope
    /// category. Moving to another territory or congregation drops every
    /// listener scoped to the old one and rebinds the scope.
    fn rescope(&mut self, category: Category, key: &str) -> &'static [Category] {
        match category {
            Category::Map | Category::Link if self.territory.as_deref() != Some(key) => {
                self.territory = Some(key.to_string());
                &TERRITORY_SCOPED
            }
            Category::Territory if self.congregation.as_deref() != Some(key) => {
                self.congregation = Some(key.to_string());
                self.territory = None;
                &Category::ALL
            }
            Category::Map => &[Category::Map],
            Category::Link => &[Category::Link],
            Category::Territory => &[Category::Territory],
            Category::Address => &[],
        }
    }

    fn live_subscriptions(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.subscription.is_some())
            .count()
    }
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    projector: AggregationProjector,
    state: Mutex<State>,
    publisher: watch::Sender<Arc<Projections>>,
}

impl Inner {
    /// Rebuild and publish the projections. Called with the lock held so
    /// publishes happen in the order state changed.
    fn publish(&self, state: &mut State) {
        state.version += 1;

        let addresses = state
            .maps
            .iter()
            .map(|address| {
                let units = state.units.get(&address.id).map(Vec::as_slice).unwrap_or_default();
                self.projector.address(address, units)
            })
            .collect();
        let progress = self
            .projector
            .territory_progress(state.maps.iter().map(|m| &m.progress));
        let visible = state
            .entries
            .iter()
            .filter(|((category, _), entry)| *category == Category::Address && entry.visible)
            .map(|((_, key), _)| key.clone())
            .collect();

        let projections = Projections {
            version: state.version,
            congregation: state.congregation.clone(),
            territory: state.territory.clone(),
            territories: state.territories.clone(),
            addresses,
            links: state.links.clone(),
            units: state.units.clone(),
            visible,
            progress,
        };
        self.publisher.send_replace(Arc::new(projections));
        observe::set_live_subscriptions(state.live_subscriptions());
    }

    fn apply(&self, category: Category, key: &str, generation: u64, snapshot: Snapshot) {
        let mut state = self.state.lock();

        let current = state
            .entries
            .get(&(category, key.to_string()))
            .map(|entry| entry.generation);
        if current != Some(generation) {
            tracing::debug!(
                %category,
                key,
                generation,
                "Discarding snapshot for closed listener"
            );
            observe::record_stale_snapshot(category.as_str());
            return;
        }

        let docs = snapshot.documents;
        match category {
            Category::Territory => {
                state.territories = docs
                    .iter()
                    .map(|d| Territory::from_document(d.id(), &d.data))
                    .collect();
            }
            Category::Map => {
                state.maps = docs
                    .iter()
                    .map(|d| Address::from_document(d.id(), &d.data))
                    .collect();
            }
            Category::Link => {
                state.links = docs
                    .iter()
                    .map(|d| LinkSession::from_document(d.id(), &d.data))
                    .collect();
            }
            Category::Address => {
                let units = docs
                    .iter()
                    .map(|d| Unit::from_document(d.id(), &d.data))
                    .collect();
                state.units.insert(key.to_string(), units);
            }
        }

        let promoted = state.phase(category) != ListenerPhase::Active;
        state.phases.insert(category, ListenerPhase::Active);
        tracing::debug!(%category, key, documents = docs.len(), "Applied snapshot");
        if promoted {
            tracing::info!(%category, key, "Listener active");
        }
        observe::record_snapshot(category.as_str());
        self.publish(&mut state);
    }
}

fn release(subscriptions: Vec<Subscription>) {
    for subscription in subscriptions {
        subscription.unsubscribe();
    }
}

/// Owner of the admin view's live subscriptions
///
/// Dropping the registry unsubscribes everything it holds.
pub struct ListenerRegistry {
    inner: Arc<Inner>,
}

impl ListenerRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (publisher, _) = watch::channel(Arc::new(Projections::default()));
        Self {
            inner: Arc::new(Inner {
                store,
                projector: AggregationProjector::new(),
                state: Mutex::new(State::default()),
                publisher,
            }),
        }
    }

    /// Registry bound to `congregation` without opening anything.
    pub fn with_congregation(self, congregation: impl Into<String>) -> Self {
        self.inner.state.lock().congregation = Some(congregation.into());
        self
    }

    /// Open the listener for `key` in `category`.
    ///
    /// - Territory: `key` is the congregation id
    /// - Map, Link: `key` is the territory id
    /// - Address: `key` is the map id; opening a live map id again only flips
    ///   its visibility
    ///
    /// For single-scope categories a listener on a different key is torn down
    /// first. A Map or Link key other than the current territory moves the
    /// registry to that territory and closes every territory-scoped listener;
    /// a Territory key other than the bound congregation closes everything.
    pub fn open(&self, category: Category, key: &str) -> Result<OpenOutcome> {
        let (query, generation, previous_phase, released) = {
            let mut state = self.inner.state.lock();
            let entry_key = (category, key.to_string());

            if let Some(entry) = state.entries.get_mut(&entry_key) {
                if category != Category::Address {
                    return Ok(OpenOutcome::AlreadyOpen);
                }
                entry.visible = !entry.visible;
                let visible = entry.visible;
                tracing::debug!(map = key, visible, "Toggled address visibility");
                self.inner.publish(&mut state);
                return Ok(OpenOutcome::Toggled { visible });
            }

            let query = Self::query_for(&state, category, key)?;

            let released = if category.is_single_scope() {
                let scope = state.rescope(category, key);
                let stale = scope.iter().any(|&c| !state.keys_of(c).is_empty());
                let released = state.tear_down(scope);
                if stale {
                    self.inner.publish(&mut state);
                }
                released
            } else {
                Vec::new()
            };

            state.next_generation += 1;
            let generation = state.next_generation;
            state.entries.insert(
                entry_key,
                Entry {
                    generation,
                    subscription: None,
                    visible: true,
                },
            );
            let previous_phase = state.phase(category);
            if previous_phase != ListenerPhase::Active {
                state.phases.insert(category, ListenerPhase::Subscribing);
            }
            (query, generation, previous_phase, released)
        };
        release(released);

        let callback = Self::callback(Arc::downgrade(&self.inner), category, key, generation);
        let subscription = match self.inner.store.subscribe(query, callback) {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!(%category, key, error = %e, "Subscribe failed");
                let mut state = self.inner.state.lock();
                let entry_key = (category, key.to_string());
                if state.entries.get(&entry_key).map(|e| e.generation) == Some(generation) {
                    state.entries.remove(&entry_key);
                    state.phases.insert(category, previous_phase);
                }
                return Err(e.into());
            }
        };

        let stale = {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(&(category, key.to_string())) {
                Some(entry) if entry.generation == generation => {
                    entry.subscription = Some(subscription);
                    observe::set_live_subscriptions(state.live_subscriptions());
                    None
                }
                _ => Some(subscription),
            }
        };
        if let Some(subscription) = stale {
            // closed while the store call was in progress
            subscription.unsubscribe();
        }

        tracing::info!(%category, key, "Opened listener");
        Ok(OpenOutcome::Subscribed)
    }

    /// Close the listener for one key. Returns whether it was open.
    pub fn close(&self, category: Category, key: &str) -> bool {
        let released = {
            let mut state = self.inner.state.lock();
            let Some(entry) = state.entries.remove(&(category, key.to_string())) else {
                return false;
            };
            match category {
                Category::Address => {
                    state.units.remove(key);
                }
                other => state.clear_slice(other),
            }
            if state.keys_of(category).is_empty() {
                state.phases.insert(category, ListenerPhase::TornDown);
            }
            self.inner.publish(&mut state);
            entry.subscription
        };
        if let Some(subscription) = released {
            subscription.unsubscribe();
        }
        tracing::info!(%category, key, "Closed listener");
        true
    }

    /// Unsubscribe every listener of `categories` and clear their state.
    pub fn close_all(&self, categories: &[Category]) {
        let released = {
            let mut state = self.inner.state.lock();
            let released = state.tear_down(categories);
            self.inner.publish(&mut state);
            released
        };
        let count = released.len();
        release(released);
        tracing::info!(?categories, released = count, "Closed listeners");
    }

    /// Move to another territory of the bound congregation.
    pub fn switch_territory(&self, territory: &str) -> Result<()> {
        {
            let state = self.inner.state.lock();
            if state.congregation.is_none() {
                return Err(ListenerError::NoCongregation(Category::Map));
            }
        }
        self.close_all(&TERRITORY_SCOPED);
        self.inner.state.lock().territory = Some(territory.to_string());
        self.open(Category::Map, territory)?;
        self.open(Category::Link, territory)?;
        tracing::info!(territory, "Switched territory");
        Ok(())
    }

    /// Move to another congregation. Every listener is closed and the
    /// territory list of the new congregation is opened.
    pub fn switch_congregation(&self, congregation: &str) -> Result<()> {
        self.close_all(&Category::ALL);
        {
            let mut state = self.inner.state.lock();
            state.congregation = Some(congregation.to_string());
            state.territory = None;
        }
        self.open(Category::Territory, congregation)?;
        tracing::info!(congregation, "Switched congregation");
        Ok(())
    }

    /// Latest published projections.
    pub fn snapshot(&self) -> Arc<Projections> {
        self.inner.publisher.borrow().clone()
    }

    /// Receiver notified on every publish.
    pub fn watch(&self) -> watch::Receiver<Arc<Projections>> {
        self.inner.publisher.subscribe()
    }

    pub fn phase(&self, category: Category) -> ListenerPhase {
        self.inner.state.lock().phase(category)
    }

    pub fn is_open(&self, category: Category, key: &str) -> bool {
        self.inner
            .state
            .lock()
            .entries
            .contains_key(&(category, key.to_string()))
    }

    /// Whether the unit listener for `map_id` is live and shown.
    pub fn is_visible(&self, map_id: &str) -> bool {
        self.inner
            .state
            .lock()
            .entries
            .get(&(Category::Address, map_id.to_string()))
            .is_some_and(|entry| entry.visible)
    }

    /// Store subscriptions currently held.
    pub fn live_subscriptions(&self) -> usize {
        self.inner.state.lock().live_subscriptions()
    }

    pub fn congregation(&self) -> Option<String> {
        self.inner.state.lock().congregation.clone()
    }

    pub fn territory(&self) -> Option<String> {
        self.inner.state.lock().territory.clone()
    }

    fn query_for(state: &State, category: Category, key: &str) -> Result<Query> {
        let congregation = || {
            state
                .congregation
                .as_deref()
                .ok_or(ListenerError::NoCongregation(category))
        };
        let query = match category {
            Category::Territory => {
                Query::collection(paths::territories(key)).order_by("code", Direction::Ascending)
            }
            Category::Map => Query::collection(paths::maps(congregation()?))
                .where_eq("territory", key)
                .order_by("name", Direction::Ascending),
            Category::Link => Query::collection(paths::links())
                .where_eq("congregation", congregation()?)
                .where_eq("territory", key),
            Category::Address => Query::collection(paths::addresses(congregation()?))
                .where_eq("map", key)
                .order_by("floor", Direction::Ascending)
                .order_by("sequence", Direction::Ascending),
        };
        Ok(query)
    }

    fn callback(
        inner: Weak<Inner>,
        category: Category,
        key: &str,
        generation: u64,
    ) -> SnapshotCallback {
        let key = key.to_string();
        Arc::new(move |snapshot: Snapshot| {
            if let Some(inner) = inner.upgrade() {
                inner.apply(category, &key, generation, snapshot);
            }
        })
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        let released = self.inner.state.lock().tear_down(&Category::ALL);
        release(released);
    }
}
