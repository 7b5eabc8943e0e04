//! Entity stores: one in-memory mirror per backend table, kept consistent
//! with local patches after each mutation instead of full refetches.

pub mod categories;
pub mod experiences;
pub mod projects;
pub mod reorder;
pub mod skills;

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::error::FolioError;
use crate::gateway::{Backend, OrderBy};

pub use categories::CategoryStore;
pub use experiences::ExperienceStore;
pub use projects::{ProjectStore, ReorderOutcome};
pub use reorder::Direction;
pub use skills::SkillStore;

/// A row type mirrored by an `EntityStore`.
pub trait Entity: Clone + DeserializeOwned + Send + Sync + 'static {
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    const TABLE: &'static str;
    /// Server-side ordering requested on load.
    const ORDER: &'static [OrderBy];

    fn id(&self) -> &str;

    /// Local counterpart of `ORDER`.
    fn compare(a: &Self, b: &Self) -> CmpOrdering;

    /// Fill in fields the store derives from its mirror before insert.
    fn prepare_draft(_draft: &mut Self::Draft, _items: &[Self]) {}
}

/// Case-insensitive comparison with a byte-wise tiebreak.
pub(crate) fn compare_text(a: &str, b: &str) -> CmpOrdering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Point-in-time copy of a store, for rendering.
#[derive(Debug, Clone)]
pub struct StoreSnapshot<E> {
    pub items: Vec<E>,
    pub loading: bool,
    pub error: Option<String>,
}

/// A mutation already applied to the mirror, kept so that a load started
/// before it can be brought up to date.
enum Change<E> {
    /// Insert, or replace the row with the same id.
    Upsert(E),
    /// Replace the row with the same id if the mirror has it.
    Replace(E),
    Remove(String),
}

impl<E: Entity> Change<E> {
    fn apply_to(&self, items: &mut Vec<E>) {
        match self {
            Change::Upsert(row) => match items.iter_mut().find(|e| e.id() == row.id()) {
                Some(slot) => *slot = row.clone(),
                None => items.insert(0, row.clone()),
            },
            Change::Replace(row) => {
                if let Some(slot) = items.iter_mut().find(|e| e.id() == row.id()) {
                    *slot = row.clone();
                }
            }
            Change::Remove(id) => items.retain(|e| e.id() != id),
        }
    }
}

struct StoreState<E> {
    items: Vec<E>,
    loading: bool,
    error: Option<String>,
    /// Ticket of the newest load whose rows have been adopted.
    applied_load: u64,
    /// Ticket of the most recently started load.
    latest_load: u64,
    loads_in_flight: usize,
    /// Mutations applied while a load was in flight, oldest first.
    journal: Vec<(u64, Change<E>)>,
}

pub struct EntityStore<E: Entity, B> {
    backend: Arc<B>,
    state: Mutex<StoreState<E>>,
    tickets: AtomicU64,
    started: AtomicBool,
}

impl<E: Entity, B: Backend> EntityStore<E, B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Mutex::new(StoreState {
                items: Vec::new(),
                loading: true,
                error: None,
                applied_load: 0,
                latest_load: 0,
                loads_in_flight: 0,
                journal: Vec::new(),
            }),
            tickets: AtomicU64::new(0),
            started: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<E>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn items(&self) -> Vec<E> {
        self.lock().items.clone()
    }

    pub fn get(&self, id: &str) -> Option<E> {
        self.lock().items.iter().find(|e| e.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot<E> {
        let state = self.lock();
        StoreSnapshot {
            items: state.items.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    /// Load the collection the first time this is called; later calls are
    /// no-ops. Use `refetch` to reload on demand.
    pub async fn ensure_loaded(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.load().await;
    }

    /// Fetch every row. Failure is recorded in `error()` and not retried.
    ///
    /// Rows from a load are discarded only when a newer load has already
    /// been adopted. Mutations that finished while the load was in flight
    /// are replayed on top of its rows.
    pub async fn load(&self) {
        self.started.store(true, Ordering::SeqCst);
        let ticket = self.next_ticket();
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
            state.latest_load = ticket;
            state.loads_in_flight += 1;
        }

        let result = self.backend.select::<E>(E::TABLE, E::ORDER).await;

        let mut state = self.lock();
        let state = &mut *state;
        state.loads_in_flight -= 1;
        if state.latest_load == ticket {
            state.loading = false;
        }
        match result {
            Ok(mut rows) if ticket > state.applied_load => {
                let mut replayed = 0;
                for (_, change) in state.journal.iter().filter(|(t, _)| *t > ticket) {
                    change.apply_to(&mut rows);
                    replayed += 1;
                }
                if replayed > 0 {
                    debug!(table = E::TABLE, ticket, replayed, "replayed mutations over load");
                }
                rows.sort_by(E::compare);
                state.items = rows;
                state.applied_load = ticket;
                state.journal.retain(|(t, _)| *t > ticket);
            }
            Ok(_) => {
                debug!(table = E::TABLE, ticket, "discarding stale load");
            }
            Err(e) => {
                warn!(table = E::TABLE, error = %e, "load failed");
                state.error = Some(e.to_string());
            }
        }
        if state.loads_in_flight == 0 {
            state.journal.clear();
        }
    }

    pub async fn refetch(&self) {
        self.load().await;
    }

    pub async fn create(&self, mut draft: E::Draft) -> Result<E, FolioError> {
        E::prepare_draft(&mut draft, &self.lock().items);
        let ticket = self.next_ticket();
        let row: E = self
            .backend
            .insert(E::TABLE, &draft)
            .await
            .map_err(|e| self.record_failure("create", e))?;

        self.apply(ticket, vec![Change::Upsert(row.clone())]);
        Ok(row)
    }

    pub async fn update(&self, id: &str, patch: E::Patch) -> Result<E, FolioError> {
        let ticket = self.next_ticket();
        let row: E = self
            .backend
            .update(E::TABLE, id, &patch)
            .await
            .map_err(|e| self.record_failure("update", e))?;

        self.apply(ticket, vec![Change::Replace(row.clone())]);
        Ok(row)
    }

    pub async fn delete(&self, id: &str) -> Result<(), FolioError> {
        let ticket = self.next_ticket();
        self.backend
            .delete(E::TABLE, id)
            .await
            .map_err(|e| self.record_failure("delete", e))?;

        self.apply(ticket, vec![Change::Remove(id.to_string())]);
        Ok(())
    }

    fn apply(&self, ticket: u64, changes: Vec<Change<E>>) {
        let mut state = self.lock();
        for change in &changes {
            change.apply_to(&mut state.items);
        }
        state.items.sort_by(E::compare);
        if state.loads_in_flight > 0 {
            state
                .journal
                .extend(changes.into_iter().map(|change| (ticket, change)));
        }
    }

    /// Adopt `items` as the rows' new state ahead of any persistence.
    pub(crate) fn apply_optimistic(&self, items: Vec<E>) {
        let ticket = self.next_ticket();
        self.apply(ticket, items.into_iter().map(Change::Upsert).collect());
    }

    fn record_failure(&self, op: &str, e: FolioError) -> FolioError {
        warn!(table = E::TABLE, op, error = %e, "mutation failed");
        self.lock().error = Some(e.to_string());
        e
    }
}
