//! Aggregating context: the four entity stores composed into one object that
//! is constructed once and handed to whatever needs portfolio data.

use std::sync::{Arc, OnceLock};

use crate::error::FolioError;
use crate::gateway::Backend;
use crate::store::{CategoryStore, ExperienceStore, ProjectStore, SkillStore};

pub struct PortfolioData<B: Backend> {
    pub projects: ProjectStore<B>,
    pub experiences: ExperienceStore<B>,
    pub skills: SkillStore<B>,
    pub categories: CategoryStore<B>,
}

impl<B: Backend> PortfolioData<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            projects: ProjectStore::new(backend.clone()),
            experiences: ExperienceStore::new(backend.clone()),
            skills: SkillStore::new(backend.clone()),
            categories: CategoryStore::new(backend),
        }
    }

    /// First-use load of all four collections, concurrently.
    pub async fn ensure_loaded(&self) {
        tokio::join!(
            self.projects.ensure_loaded(),
            self.experiences.ensure_loaded(),
            self.skills.ensure_loaded(),
            self.categories.ensure_loaded(),
        );
    }

    pub async fn refetch_all(&self) {
        tokio::join!(
            self.projects.refetch(),
            self.experiences.refetch(),
            self.skills.refetch(),
            self.categories.refetch(),
        );
    }

    pub fn is_loading(&self) -> bool {
        self.projects.is_loading()
            || self.experiences.is_loading()
            || self.skills.is_loading()
            || self.categories.is_loading()
    }
}

/// Slot holding the shared `PortfolioData` once it has been provided.
pub struct DataProvider<B: Backend> {
    slot: OnceLock<Arc<PortfolioData<B>>>,
}

impl<B: Backend> Default for DataProvider<B> {
    fn default() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }
}

impl<B: Backend> DataProvider<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `data`. A second call keeps the first value and returns the
    /// one that is installed.
    pub fn provide(&self, data: PortfolioData<B>) -> Arc<PortfolioData<B>> {
        self.slot.get_or_init(|| Arc::new(data)).clone()
    }

    pub fn data(&self) -> Result<Arc<PortfolioData<B>>, FolioError> {
        self.slot.get().cloned().ok_or(FolioError::ContextUnavailable)
    }
}
