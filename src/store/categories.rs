use std::cmp::Ordering;

use super::{Entity, EntityStore, compare_text};
use crate::gateway::{OrderBy, SKILL_CATEGORIES_TABLE};
use crate::models::{NewSkillCategory, SkillCategory, SkillCategoryPatch};

pub type CategoryStore<B> = EntityStore<SkillCategory, B>;

impl Entity for SkillCategory {
    type Draft = NewSkillCategory;
    type Patch = SkillCategoryPatch;

    const TABLE: &'static str = SKILL_CATEGORIES_TABLE;
    const ORDER: &'static [OrderBy] = &[OrderBy::asc("name")];

    fn id(&self) -> &str {
        &self.id
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        compare_text(&a.name, &b.name)
    }
}
