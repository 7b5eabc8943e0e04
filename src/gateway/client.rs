use std::sync::{Arc, RwLock, RwLockReadGuard};

use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{Backend, ObjectStore, OrderBy};
use crate::config::Config;
use crate::error::{BackendErrorBody, FolioError};

const PREFER_REPRESENTATION: &str = "return=representation";

/// Configured handle to the hosted backend. Cheap to clone; clones share the
/// HTTP connection pool and the admin session.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: String,
    session: RwLock<Option<String>>,
}

impl Gateway {
    pub fn new(base_url: Url, anon_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, anon_key)
    }

    pub fn with_client(client: reqwest::Client, mut base_url: Url, anon_key: impl Into<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            inner: Arc::new(GatewayInner {
                client,
                base_url,
                anon_key: anon_key.into(),
                session: RwLock::new(None),
            }),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.supabase_url.clone(), cfg.supabase_anon_key.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub(super) fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    pub(super) fn set_session(&self, token: Option<String>) {
        let mut slot = self
            .inner
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = token;
    }

    fn session(&self) -> RwLockReadGuard<'_, Option<String>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_signed_in(&self) -> bool {
        self.session().is_some()
    }

    pub(super) fn endpoint(&self, path: &str) -> Result<Url, FolioError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn bearer(&self) -> String {
        self.session()
            .clone()
            .unwrap_or_else(|| self.inner.anon_key.clone())
    }

    /// Attach the key headers every backend request needs.
    pub(super) fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = format!("Bearer {}", self.bearer());
        req.header("apikey", self.inner.anon_key.as_str())
            .header(AUTHORIZATION, bearer)
    }

    fn rows_url(&self, table: &str) -> Result<Url, FolioError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn object_url(&self, bucket: &str, path: &str) -> Result<Url, FolioError> {
        self.endpoint(&format!("storage/v1/object/{bucket}/{path}"))
    }

    /// Read a successful JSON body or turn the backend's error body into a
    /// `FolioError::Backend`.
    pub(super) async fn read_json<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, FolioError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(BackendErrorBody::parse(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub(super) async fn expect_success(resp: reqwest::Response) -> Result<(), FolioError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.bytes().await?;
        Err(BackendErrorBody::parse(status, &body))
    }

    fn single<T>(mut rows: Vec<T>, table: &str, id: &str) -> Result<T, FolioError> {
        if rows.is_empty() {
            return Err(FolioError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(rows.swap_remove(0))
    }
}

impl Backend for Gateway {
    async fn select<T>(&self, table: &str, order: &[OrderBy]) -> Result<Vec<T>, FolioError>
    where
        T: DeserializeOwned + Send,
    {
        let mut query = vec![("select", "*".to_string())];
        if !order.is_empty() {
            query.push(("order", OrderBy::render(order)));
        }
        debug!(table, "select");
        let resp = self
            .authorized(self.client().get(self.rows_url(table)?))
            .query(&query)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn insert<T, P>(&self, table: &str, row: &P) -> Result<T, FolioError>
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync,
    {
        let rows: Vec<T> = self.insert_many(table, std::slice::from_ref(row)).await?;
        Self::single(rows, table, "<new>")
    }

    async fn insert_many<T, P>(&self, table: &str, rows: &[P]) -> Result<Vec<T>, FolioError>
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync,
    {
        debug!(table, count = rows.len(), "insert");
        let resp = self
            .authorized(self.client().post(self.rows_url(table)?))
            .header("Prefer", PREFER_REPRESENTATION)
            .json(rows)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn update<T, P>(&self, table: &str, id: &str, patch: &P) -> Result<T, FolioError>
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync,
    {
        debug!(table, id, "update");
        let resp = self
            .authorized(self.client().patch(self.rows_url(table)?))
            .header("Prefer", PREFER_REPRESENTATION)
            .query(&[("id", format!("eq.{id}"))])
            .json(patch)
            .send()
            .await?;
        let rows: Vec<T> = Self::read_json(resp).await?;
        Self::single(rows, table, id)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), FolioError> {
        debug!(table, id, "delete");
        let resp = self
            .authorized(self.client().delete(self.rows_url(table)?))
            .header("Prefer", PREFER_REPRESENTATION)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = Self::read_json(resp).await?;
        Self::single(rows, table, id).map(|_| ())
    }
}

impl ObjectStore for Gateway {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), FolioError> {
        debug!(bucket, path, size = bytes.len(), "upload object");
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        let resp = self
            .authorized(self.client().post(self.object_url(bucket, path)?))
            .header(CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        Self::expect_success(resp).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, FolioError> {
        self.endpoint(&format!("storage/v1/object/public/{bucket}/{path}"))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), FolioError> {
        debug!(bucket, count = paths.len(), "remove objects");
        let resp = self
            .authorized(
                self.client()
                    .delete(self.endpoint(&format!("storage/v1/object/{bucket}"))?),
            )
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::expect_success(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> Gateway {
        Gateway::new(Url::parse(base).unwrap(), "anon")
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_its_path() {
        let gw = gateway("https://abc.supabase.co/proxy");
        assert_eq!(
            gw.rows_url("projects").unwrap().as_str(),
            "https://abc.supabase.co/proxy/rest/v1/projects"
        );
    }

    #[test]
    fn public_url_points_at_public_object_route() {
        let gw = gateway("https://abc.supabase.co");
        let url = gw
            .public_url("portfolio-images", "projects/1-abc.png")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/storage/v1/object/public/portfolio-images/projects/1-abc.png"
        );
        assert_eq!(
            gw.object_url("portfolio-images", "projects/1-abc.png")
                .unwrap()
                .as_str(),
            "https://abc.supabase.co/storage/v1/object/portfolio-images/projects/1-abc.png"
        );
    }

    #[test]
    fn anon_key_is_bearer_until_signed_in() {
        let gw = gateway("https://abc.supabase.co");
        assert_eq!(gw.bearer(), "anon");
        assert!(!gw.is_signed_in());
        gw.set_session(Some("user-jwt".into()));
        assert_eq!(gw.bearer(), "user-jwt");
        assert!(gw.is_signed_in());
        gw.set_session(None);
        assert_eq!(gw.bearer(), "anon");
    }

    #[test]
    fn poisoned_session_lock_keeps_the_token() {
        let gw = gateway("https://abc.supabase.co");
        gw.set_session(Some("user-jwt".into()));
        let poisoner = gw.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.session.write().unwrap();
            panic!("poison the session lock");
        })
        .join();
        assert!(gw.inner.session.is_poisoned());

        assert!(gw.is_signed_in());
        assert_eq!(gw.bearer(), "user-jwt");
        gw.set_session(None);
        assert!(!gw.is_signed_in());
        assert_eq!(gw.bearer(), "anon");
    }

    #[test]
    fn empty_update_result_is_not_found() {
        let err = Gateway::single(Vec::<i32>::new(), "skills", "s9").unwrap_err();
        assert!(matches!(err, FolioError::NotFound { .. }));
        assert_eq!(err.to_string(), "No row in skills with id s9");
    }
}
