use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Personal,
    Company,
    Client,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub link: Option<String>,
    pub project_type: ProjectType,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub project_type: ProjectType,
    #[serde(default)]
    pub tools: Vec<String>,
    /// Left empty, the store assigns one past the largest order it holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl NewProject {
    pub fn new(title: impl Into<String>, project_type: ProjectType) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            image_url: String::new(),
            link: None,
            project_type,
            tools: Vec::new(),
            display_order: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<Option<i32>>,
}

impl ProjectPatch {
    pub fn display_order(order: i32) -> Self {
        Self {
            display_order: Some(Some(order)),
            ..Self::default()
        }
    }
}
