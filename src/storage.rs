use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::{
    io::Write,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tempfile::NamedTempFile;

use crate::{config::CloudinaryConfig, forms::UploadedFile, models::MediaRef};

/// MediaError
///
/// Failures talking to the media host or staging a file for it.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("media host request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The host answered but refused the operation.
    #[error("media host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

/// StagedUpload
///
/// An uploaded file written to a temporary file named after the current
/// millisecond timestamp. The file is removed when the handle drops, whether
/// or not the upload succeeded.
pub struct StagedUpload {
    file: NamedTempFile,
    pub file_name: String,
    pub content_type: String,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// stage_upload
///
/// Writes the uploaded bytes to disk on the blocking pool.
pub async fn stage_upload(upload: UploadedFile) -> Result<StagedUpload, MediaError> {
    let UploadedFile {
        file_name,
        content_type,
        bytes,
        ..
    } = upload;

    let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", Utc::now().timestamp_millis()))
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(StagedUpload {
        file,
        file_name,
        content_type,
    })
}

/// MediaHost
///
/// The contract for the external image host. Swapped for `MockMediaHost` in
/// tests so handlers can be exercised without network access.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Uploads the staged file into `folder` and returns the stored reference.
    async fn upload(&self, file: &StagedUpload, folder: &str) -> Result<MediaRef, MediaError>;

    /// Deletes the asset identified by `public_id`. Deleting an unknown asset is not an error.
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

pub type MediaState = Arc<dyn MediaHost>;

// --- Cloudinary ---

#[derive(Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// CloudinaryClient
///
/// Signed calls to the Cloudinary upload API (`image/upload`, `image/destroy`).
pub struct CloudinaryClient {
    client: reqwest::Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        let base_url = format!("https://api.cloudinary.com/v1_1/{}", config.cloud_name);
        Self {
            client: reqwest::Client::new(),
            config,
            base_url,
        }
    }

    fn signed_form(&self, params: &[(&str, String)]) -> reqwest::multipart::Form {
        let signature = sign_params(params, &self.config.api_secret);
        params
            .iter()
            .fold(reqwest::multipart::Form::new(), |form, (key, value)| {
                form.text(key.to_string(), value.clone())
            })
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(MediaError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload(&self, file: &StagedUpload, folder: &str) -> Result<MediaRef, MediaError> {
        let bytes = tokio::fs::read(file.path()).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;

        let params = upload_params(folder, Utc::now().timestamp());
        let form = self.signed_form(&params).part("file", part);

        let response = self
            .client
            .post(format!("{}/image/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let result: UploadResult = Self::ensure_success(response).await?.json().await?;

        tracing::info!(public_id = %result.public_id, folder, "uploaded image");
        Ok(MediaRef {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let params = [
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let response = self
            .client
            .post(format!("{}/image/destroy", self.base_url))
            .multipart(self.signed_form(&params))
            .send()
            .await?;
        Self::ensure_success(response).await?;

        tracing::info!(public_id, "deleted image");
        Ok(())
    }
}

/// Incoming transformation applied to every upload: automatic quality and format.
pub const UPLOAD_TRANSFORMATION: &str = "q_auto,f_auto";

/// The signed parameters of an `image/upload` call.
pub fn upload_params(folder: &str, timestamp: i64) -> Vec<(&'static str, String)> {
    vec![
        ("folder", folder.to_string()),
        ("timestamp", timestamp.to_string()),
        ("transformation", UPLOAD_TRANSFORMATION.to_string()),
    ]
}

/// sign_params
///
/// Cloudinary request signature: the parameters sorted by name, joined as
/// `k=v&k=v`, with the API secret appended, hashed with SHA-1 (lowercase hex),
/// the algorithm Cloudinary accounts verify by default.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by_key(|(k, _)| *k);

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

// --- Mock (for tests) ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    Uploaded { folder: String, public_id: String },
    Deleted(String),
}

/// MockMediaHost
///
/// Records every call in order so tests can assert on upload/delete ordering.
#[derive(Default)]
pub struct MockMediaHost {
    /// When true, uploads fail.
    pub should_fail: bool,
    /// When true, deletes fail.
    pub fail_deletes: bool,
    counter: AtomicUsize,
    events: Mutex<Vec<MediaEvent>>,
}

impl MockMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn new_failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<MediaEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MediaEvent::Deleted(id) => Some(id),
                MediaEvent::Uploaded { .. } => None,
            })
            .collect()
    }

    fn record(&self, event: MediaEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl MediaHost for MockMediaHost {
    async fn upload(&self, file: &StagedUpload, folder: &str) -> Result<MediaRef, MediaError> {
        if self.should_fail {
            return Err(MediaError::Rejected {
                status: 500,
                message: "Mock media error: simulation requested".to_string(),
            });
        }
        // The staged file must still exist while the upload runs.
        if !file.path().exists() {
            return Err(MediaError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let public_id = format!("{folder}/mock-{n}");
        self.record(MediaEvent::Uploaded {
            folder: folder.to_string(),
            public_id: public_id.clone(),
        });

        Ok(MediaRef {
            url: format!("https://res.cloudinary.com/mock/image/upload/{public_id}"),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail_deletes {
            return Err(MediaError::Rejected {
                status: 500,
                message: "Mock media error: delete refused".to_string(),
            });
        }
        self.record(MediaEvent::Deleted(public_id.to_string()));
        Ok(())
    }
}
