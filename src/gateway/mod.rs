//! Backend Gateway Client.
//!
//! `Backend` and `ObjectStore` are the request/response seams every store and
//! helper talks through. `Gateway` is the REST implementation against the
//! hosted backend; tests use the in-memory double in `memory`.

pub mod auth;
pub mod client;
#[cfg(test)]
pub mod memory;

use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::error::FolioError;

pub use auth::Session;
pub use client::Gateway;

pub const PROJECTS_TABLE: &str = "projects";
pub const EXPERIENCES_TABLE: &str = "experiences";
pub const SKILLS_TABLE: &str = "skills";
pub const SKILL_CATEGORIES_TABLE: &str = "skill_categories";
pub const IMAGE_BUCKET: &str = "portfolio-images";

/// One `order=` clause of a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    /// Render a list of clauses as a PostgREST `order` parameter value.
    pub fn render(order: &[OrderBy]) -> String {
        order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Row storage of the hosted backend. Every row carries a string `id`;
/// the backend assigns `id` and `created_at` on insert.
pub trait Backend: Send + Sync {
    fn select<T>(
        &self,
        table: &str,
        order: &[OrderBy],
    ) -> impl Future<Output = Result<Vec<T>, FolioError>> + Send
    where
        T: DeserializeOwned + Send;

    fn insert<T, P>(
        &self,
        table: &str,
        row: &P,
    ) -> impl Future<Output = Result<T, FolioError>> + Send
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync;

    fn insert_many<T, P>(
        &self,
        table: &str,
        rows: &[P],
    ) -> impl Future<Output = Result<Vec<T>, FolioError>> + Send
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync;

    /// Apply `patch` to the row with `id` and return the stored row.
    /// Fails with `NotFound` when no row matches.
    fn update<T, P>(
        &self,
        table: &str,
        id: &str,
        patch: &P,
    ) -> impl Future<Output = Result<T, FolioError>> + Send
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync;

    /// Fails with `NotFound` when no row matches.
    fn delete(&self, table: &str, id: &str) -> impl Future<Output = Result<(), FolioError>> + Send;
}

/// Object storage of the hosted backend.
pub trait ObjectStore: Send + Sync {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), FolioError>> + Send;

    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, FolioError>;

    fn remove(
        &self,
        bucket: &str,
        paths: &[String],
    ) -> impl Future<Output = Result<(), FolioError>> + Send;
}
