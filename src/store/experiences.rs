use std::cmp::Ordering;

use super::{Entity, EntityStore};
use crate::gateway::{EXPERIENCES_TABLE, OrderBy};
use crate::models::{Experience, ExperiencePatch, NewExperience};

pub type ExperienceStore<B> = EntityStore<Experience, B>;

impl Entity for Experience {
    type Draft = NewExperience;
    type Patch = ExperiencePatch;

    const TABLE: &'static str = EXPERIENCES_TABLE;
    const ORDER: &'static [OrderBy] = &[OrderBy::desc("start_date")];

    fn id(&self) -> &str {
        &self.id
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        b.start_date.cmp(&a.start_date)
    }
}
