use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{Entity, EntityStore, compare_text};
use crate::gateway::{Backend, OrderBy, SKILLS_TABLE};
use crate::models::{NewSkill, Skill, SkillPatch};

pub type SkillStore<B> = EntityStore<Skill, B>;

impl Entity for Skill {
    type Draft = NewSkill;
    type Patch = SkillPatch;

    const TABLE: &'static str = SKILLS_TABLE;
    const ORDER: &'static [OrderBy] = &[OrderBy::asc("category"), OrderBy::asc("name")];

    fn id(&self) -> &str {
        &self.id
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        compare_text(&a.category, &b.category).then_with(|| compare_text(&a.name, &b.name))
    }
}

impl<B: Backend> EntityStore<Skill, B> {
    /// Skills grouped under their category label, categories in name order.
    pub fn grouped_by_category(&self) -> BTreeMap<String, Vec<Skill>> {
        let mut groups: BTreeMap<String, Vec<Skill>> = BTreeMap::new();
        for skill in self.items() {
            groups.entry(skill.category.clone()).or_default().push(skill);
        }
        groups
    }
}
