use std::cmp::Ordering as CmpOrdering;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tracing::{info, warn};

use super::reorder::{Direction, assign_display_order, swap_adjacent};
use super::{Entity, EntityStore};
use crate::gateway::{Backend, OrderBy, PROJECTS_TABLE};
use crate::models::{NewProject, Project, ProjectPatch};

impl Entity for Project {
    type Draft = NewProject;
    type Patch = ProjectPatch;

    const TABLE: &'static str = PROJECTS_TABLE;
    const ORDER: &'static [OrderBy] = &[OrderBy::asc("display_order"), OrderBy::desc("created_at")];

    fn id(&self) -> &str {
        &self.id
    }

    fn compare(a: &Self, b: &Self) -> CmpOrdering {
        // Missing orders sort last, as the backend does for ascending columns.
        let by_order = match (a.display_order, b.display_order) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => CmpOrdering::Less,
            (None, Some(_)) => CmpOrdering::Greater,
            (None, None) => CmpOrdering::Equal,
        };
        by_order.then_with(|| b.created_at.cmp(&a.created_at))
    }

    /// One past the largest order held locally. Two concurrent creates can
    /// compute the same value.
    fn prepare_draft(draft: &mut NewProject, items: &[Project]) {
        if draft.display_order.is_none() {
            let max = items
                .iter()
                .map(|p| p.display_order.unwrap_or(0))
                .fold(0, i32::max);
            draft.display_order = Some(max + 1);
        }
    }
}

/// Result of a reorder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The move fell outside the list; nothing changed or was sent.
    Unchanged,
    /// The new order was applied locally and one update per row was sent.
    /// `failed` lists rows whose update was rejected; they are not rolled back.
    Applied { persisted: usize, failed: Vec<String> },
}

impl ReorderOutcome {
    pub fn is_fully_persisted(&self) -> bool {
        match self {
            ReorderOutcome::Unchanged => true,
            ReorderOutcome::Applied { failed, .. } => failed.is_empty(),
        }
    }
}

/// Projects mirror with display-order management on top of the generic
/// entity operations.
pub struct ProjectStore<B: Backend> {
    store: EntityStore<Project, B>,
    /// Reorders still persisting.
    saving: AtomicUsize,
}

impl<B: Backend> Deref for ProjectStore<B> {
    type Target = EntityStore<Project, B>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<B: Backend> ProjectStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            store: EntityStore::new(backend),
            saving: AtomicUsize::new(0),
        }
    }

    /// Whether any reorder is still persisting.
    pub fn is_saving_order(&self) -> bool {
        self.saving.load(Ordering::SeqCst) > 0
    }

    /// Move the project at `index` of the current list one step.
    pub async fn move_project(&self, index: usize, direction: Direction) -> ReorderOutcome {
        let current = self.store.items();
        match swap_adjacent(&current, index, direction) {
            Some(reordered) => self.update_order(reordered).await,
            None => ReorderOutcome::Unchanged,
        }
    }

    /// Adopt `ordered` as the new sequence: orders become 1..=N, the mirror
    /// is replaced immediately, then every row is updated in parallel.
    pub async fn update_order(&self, mut ordered: Vec<Project>) -> ReorderOutcome {
        assign_display_order(&mut ordered);
        self.store.apply_optimistic(ordered.clone());

        self.saving.fetch_add(1, Ordering::SeqCst);
        let backend = self.store.backend();
        let results = join_all(ordered.iter().map(|p| async move {
            let patch = ProjectPatch::display_order(p.display_order.unwrap_or_default());
            let result = backend
                .update::<Project, _>(PROJECTS_TABLE, &p.id, &patch)
                .await;
            (p.id.clone(), result)
        }))
        .await;
        self.saving.fetch_sub(1, Ordering::SeqCst);

        let mut persisted = 0;
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(_) => persisted += 1,
                Err(e) => {
                    warn!(id = %id, error = %e, "display order update failed");
                    failed.push(id);
                }
            }
        }
        info!(persisted, failed = failed.len(), "project order saved");
        ReorderOutcome::Applied { persisted, failed }
    }
}
