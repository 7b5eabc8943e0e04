//! Typed rows mirrored from the hosted backend, and the per-entity input
//! structs used to create (`New*`) and partially update (`*Patch`) them.
//!
//! Nullable columns in patches are `Option<Option<T>>`: the outer `None`
//! leaves the column untouched, `Some(None)` clears it.

pub mod category;
pub mod experience;
pub mod project;
pub mod skill;

pub use category::{NewSkillCategory, SkillCategory, SkillCategoryPatch};
pub use experience::{Experience, ExperiencePatch, NewExperience};
pub use project::{NewProject, Project, ProjectPatch, ProjectType};
pub use skill::{NewSkill, Proficiency, Skill, SkillPatch};
