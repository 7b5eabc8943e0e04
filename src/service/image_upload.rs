use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};
use url::Url;

use crate::error::FolioError;
use crate::gateway::{IMAGE_BUCKET, ObjectStore};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_FOLDER: &str = "projects";

const SUFFIX_LEN: usize = 11;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An image picked by the admin, as received from the form.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    fn validate(&self) -> Result<(), FolioError> {
        if !self.content_type.starts_with("image/") {
            return Err(FolioError::Validation(
                "Please select a valid image file".to_string(),
            ));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(FolioError::Validation(
                "Image size must be less than 5MB".to_string(),
            ));
        }
        Ok(())
    }

    /// Text after the last `.`, or the whole name when there is none.
    fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// `<unix millis>-<random base36>.<ext>`
fn unique_name(ext: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, ext)
}

/// Storage path (`folder/file`) from a public object URL: its last two
/// path segments.
pub fn storage_path_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let mut segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    let file = segments.pop()?;
    let folder = segments.pop()?;
    Some(format!("{folder}/{file}"))
}

pub struct ImageUploader<S> {
    store: Arc<S>,
    uploading: AtomicBool,
    error: Mutex<Option<String>>,
}

impl<S: ObjectStore> ImageUploader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            uploading: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_error(&self, message: Option<String>) {
        *self
            .error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = message;
    }

    /// Validate and store `file` under `folder`, returning its public URL.
    /// Validation happens before any request is made.
    pub async fn upload(&self, file: &ImageFile, folder: &str) -> Result<Url, FolioError> {
        self.uploading.store(true, Ordering::SeqCst);
        self.set_error(None);

        let result = self.upload_inner(file, folder).await;

        if let Err(e) = &result {
            self.set_error(Some(e.to_string()));
        }
        self.uploading.store(false, Ordering::SeqCst);
        result
    }

    async fn upload_inner(&self, file: &ImageFile, folder: &str) -> Result<Url, FolioError> {
        file.validate()?;
        let path = format!("{folder}/{}", unique_name(file.extension()));
        self.store
            .upload(IMAGE_BUCKET, &path, &file.content_type, file.bytes.clone())
            .await?;
        let url = self.store.public_url(IMAGE_BUCKET, &path)?;
        info!(path = %path, size = file.bytes.len(), "image uploaded");
        Ok(url)
    }

    /// Remove a previously uploaded image. Best effort: failures are logged
    /// and otherwise ignored.
    pub async fn delete(&self, image_url: &str) {
        let Some(path) = storage_path_from_url(image_url) else {
            warn!(url = image_url, "cannot derive storage path from image URL");
            return;
        };
        match self.store.remove(IMAGE_BUCKET, &[path.clone()]).await {
            Ok(()) => info!(path = %path, "old image removed"),
            Err(e) => warn!(path = %path, error = %e, "failed to delete old image"),
        }
    }
}
