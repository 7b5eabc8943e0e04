//! In-memory stand-in for the hosted backend, used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::Notify;
use url::Url;

use super::{Backend, ObjectStore, OrderBy};
use crate::error::FolioError;

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    next_id: AtomicU64,
    requests: AtomicUsize,
    fail_next: Mutex<Option<String>>,
    failing_updates: Mutex<HashSet<String>>,
    fail_removes: AtomicBool,
    select_gate: Mutex<Option<Arc<Notify>>>,
    update_gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of requests received so far, failed ones included.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Make the next request of any kind fail with `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_updates_for(&self, id: &str) {
        self.failing_updates.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_removes(&self) {
        self.fail_removes.store(true, Ordering::SeqCst);
    }

    /// Hold every select open after it has read its rows, until the returned
    /// handle is notified.
    pub fn gate_selects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.select_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold every update before it touches its row; each notification lets
    /// one through.
    pub fn gate_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.update_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
        self.objects
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{path}"))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    fn begin(&self) -> Result<(), FolioError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().unwrap().take() {
            Some(message) => Err(failure(message)),
            None => Ok(()),
        }
    }

    fn stamp(&self, table: &str, payload: Value) -> Result<Value, FolioError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let Value::Object(mut row) = payload else {
            return Err(failure("row payload must be an object".into()));
        };
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(n as i64);
        row.insert("id".into(), Value::String(format!("{table}-{n}")));
        row.insert("created_at".into(), Value::String(created_at.to_rfc3339()));
        Ok(Value::Object(row))
    }
}

fn failure(message: String) -> FolioError {
    FolioError::Backend {
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        message,
    }
}

fn not_found(table: &str, id: &str) -> FolioError {
    FolioError::NotFound {
        table: table.to_string(),
        id: id.to_string(),
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

impl Backend for MemoryBackend {
    async fn select<T>(&self, table: &str, _order: &[OrderBy]) -> Result<Vec<T>, FolioError>
    where
        T: DeserializeOwned + Send,
    {
        self.begin()?;
        let rows = self.rows(table);
        let gate = self.select_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(FolioError::from))
            .collect()
    }

    async fn insert<T, P>(&self, table: &str, row: &P) -> Result<T, FolioError>
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync,
    {
        let mut rows: Vec<T> = self.insert_many(table, std::slice::from_ref(row)).await?;
        Ok(rows.remove(0))
    }

    async fn insert_many<T, P>(&self, table: &str, rows: &[P]) -> Result<Vec<T>, FolioError>
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync,
    {
        self.begin()?;
        let stamped = rows
            .iter()
            .map(|row| self.stamp(table, serde_json::to_value(row)?))
            .collect::<Result<Vec<_>, FolioError>>()?;
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(stamped.iter().cloned());
        stamped
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(FolioError::from))
            .collect()
    }

    async fn update<T, P>(&self, table: &str, id: &str, patch: &P) -> Result<T, FolioError>
    where
        T: DeserializeOwned + Send,
        P: Serialize + Sync,
    {
        self.begin()?;
        let gate = self.update_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing_updates.lock().unwrap().contains(id) {
            return Err(failure(format!("update of {id} rejected")));
        }
        let Value::Object(fields) = serde_json::to_value(patch)? else {
            return Err(failure("patch must be an object".into()));
        };
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| not_found(table, id))?;
        if let Value::Object(existing) = row {
            existing.extend(fields);
        }
        Ok(serde_json::from_value(row.clone())?)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), FolioError> {
        self.begin()?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.get_mut(table).ok_or_else(|| not_found(table, id))?;
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        if rows.len() == before {
            return Err(not_found(table, id));
        }
        Ok(())
    }
}

impl ObjectStore for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), FolioError> {
        self.begin()?;
        let key = format!("{bucket}/{path}");
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(failure("The resource already exists".into()));
        }
        objects.insert(key, (content_type.to_string(), bytes));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, FolioError> {
        Ok(Url::parse(&format!(
            "https://test.supabase.co/storage/v1/object/public/{bucket}/{path}"
        ))?)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), FolioError> {
        self.begin()?;
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(failure("remove rejected".into()));
        }
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&format!("{bucket}/{path}"));
        }
        Ok(())
    }
}
