//! Filesystem media backend. Objects are written under a root directory and served by the app at `/uploads`.

use super::{join_url, MediaStore, StoredMedia, UploadedFile};
use crate::error::MediaError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub async fn new(root: PathBuf, public_base_url: String) -> Result<Self, MediaError> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, public_base_url })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, MediaError> {
        let rel = Path::new(key);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(MediaError::Backend(format!("invalid media key '{}'", key)));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(&self, key: &str, file: &UploadedFile) -> Result<StoredMedia, MediaError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write to a temp name then rename so readers never see a partial file.
        let tmp = path.with_extension("partial");
        let mut f = tokio::fs::File::create(&tmp).await?;
        f.write_all(&file.bytes).await?;
        f.sync_all().await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(StoredMedia {
            url: join_url(&self.public_base_url, key),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), MediaError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{upload, FileNaming, MediaKind, UploadProfile};

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            field_name: "file".into(),
            file_name: name.into(),
            content_type: "application/pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn put_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf(), "http://cdn.test/uploads/".into())
            .await
            .unwrap();
        let profile = UploadProfile {
            folder: "mandates".into(),
            kind: MediaKind::Document,
            naming: FileNaming::Sanitized,
        };
        let stored = upload(&store, &profile, &pdf("Mandate 2025.pdf")).await.unwrap();
        assert!(stored.url.starts_with("http://cdn.test/uploads/mandates/"));
        assert!(stored.key.starts_with("mandates/"));
        let on_disk = store.root().join(&stored.key);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"%PDF-1.4");

        store.delete(&stored.key).await.unwrap();
        assert!(!on_disk.exists());
        // second delete of a missing object is fine
        store.delete(&stored.key).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf(), "http://x".into()).await.unwrap();
        assert!(store.put("../outside.pdf", &pdf("a.pdf")).await.is_err());
        assert!(store.delete("/etc/passwd").await.is_err());
    }
}
