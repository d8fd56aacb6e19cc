//! Media storage adapter: uploads binaries to a durable store and returns a public URL plus a key for later deletion.

mod local;
mod profile;
mod s3;

pub use local::LocalMediaStore;
pub use profile::{sanitize_file_name, FileNaming, MediaKind, UploadProfile};
pub use s3::S3MediaStore;

use crate::config::MediaBackendSettings;
use crate::error::MediaError;
use async_trait::async_trait;
use std::sync::Arc;

/// One binary part received in a request, fully buffered.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Multipart field name; for tab sync this is the client's temporary id.
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where an upload landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredMedia {
    pub url: String,
    pub key: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `file` under the profile's folder.
    async fn put(&self, key: &str, file: &UploadedFile) -> Result<StoredMedia, MediaError>;

    /// Delete a stored object by key. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<(), MediaError>;
}

/// Check the file against the profile, derive the key, and store it.
pub async fn upload(
    store: &dyn MediaStore,
    profile: &UploadProfile,
    file: &UploadedFile,
) -> Result<StoredMedia, MediaError> {
    profile.check(&file.content_type, &file.file_name, file.bytes.len())?;
    let key = profile.object_key(&file.file_name);
    let stored = store.put(&key, file).await?;
    tracing::info!(key = %stored.key, bytes = file.bytes.len(), folder = %profile.folder, "media uploaded");
    Ok(stored)
}

/// Best-effort delete: failures are logged and swallowed.
pub async fn delete_quietly(store: &dyn MediaStore, key: &str) -> bool {
    match store.delete(key).await {
        Ok(()) => {
            tracing::info!(key = %key, "media deleted");
            true
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to delete media");
            false
        }
    }
}

/// Build the configured backend.
pub async fn build_store(settings: &MediaBackendSettings) -> Result<Arc<dyn MediaStore>, MediaError> {
    Ok(match settings {
        MediaBackendSettings::Local { dir, public_base_url } => {
            Arc::new(LocalMediaStore::new(dir.clone(), public_base_url.clone()).await?)
        }
        MediaBackendSettings::S3 {
            bucket,
            region,
            endpoint,
            public_base_url,
        } => Arc::new(S3MediaStore::connect(bucket, region, endpoint.as_deref(), public_base_url).await),
    })
}

pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
