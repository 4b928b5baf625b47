//! Local file storage for inspection photos
//!
//! Uploads are written in two phases. Files land in a staging directory
//! while the request is still being read, and are moved to their public
//! location only once the report row is in place. A failed submission
//! discards its staged files and deletes anything already published, so no
//! committed report points at a missing photo.

use std::path::PathBuf;

use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};

const STAGING_DIR: &str = "staging";
const PUBLIC_DIR: &str = "reception";

/// Photo storage rooted at a local directory
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

/// A photo written to staging, not yet visible
#[derive(Debug)]
pub struct StagedFile {
    file_name: String,
    staged_path: PathBuf,
}

impl StagedFile {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl FileStorage {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_dir),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_bytes: config.max_photo_bytes,
        }
    }

    /// Directory holding promoted photos
    pub fn public_dir(&self) -> PathBuf {
        self.root.join(PUBLIC_DIR)
    }

    /// URL path promoted photos are served under
    pub fn public_route(&self) -> String {
        format!("{}/{}", self.public_prefix, PUBLIC_DIR)
    }

    /// Write an upload to staging under a fresh name keeping its extension
    pub async fn save_upload(&self, bytes: &[u8], extension: &str) -> AppResult<StagedFile> {
        if bytes.is_empty() {
            return Err(AppError::validation("photo", "Uploaded photo is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::validation(
                "photo",
                format!("Photo exceeds the {} byte limit", self.max_bytes),
            ));
        }

        let dir = self.root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_error("create staging directory", e))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let staged_path = dir.join(&file_name);
        tokio::fs::write(&staged_path, bytes)
            .await
            .map_err(|e| storage_error("write staged photo", e))?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Staged upload");
        Ok(StagedFile {
            file_name,
            staged_path,
        })
    }

    /// URL the file will be served from once promoted
    pub fn public_url(&self, file: &StagedFile) -> String {
        format!("{}/{}", self.public_route(), file.file_name())
    }

    /// Move a staged file to its public location
    pub async fn promote(&self, file: &StagedFile) -> AppResult<()> {
        let dir = self.public_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_error("create public directory", e))?;
        tokio::fs::rename(&file.staged_path, dir.join(&file.file_name))
            .await
            .map_err(|e| storage_error("promote photo", e))
    }

    /// Delete a promoted file by its public URL
    pub async fn delete_file(&self, url: &str) -> AppResult<()> {
        let route = format!("{}/", self.public_route());
        let name = url
            .strip_prefix(&route)
            .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
            .ok_or_else(|| AppError::validation("url", "Not a stored photo URL"))?;

        tokio::fs::remove_file(self.public_dir().join(name))
            .await
            .map_err(|e| storage_error("delete photo", e))
    }

    /// Drop staged files after a failed submission
    pub async fn discard(&self, files: &[StagedFile]) {
        for file in files {
            if let Err(e) = tokio::fs::remove_file(&file.staged_path).await {
                tracing::warn!(file = %file.file_name(), error = %e, "Failed to discard staged photo");
            }
        }
    }
}

fn storage_error(action: &str, err: std::io::Error) -> AppError {
    AppError::StorageError(format!("Failed to {}: {}", action, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir, max_photo_bytes: usize) -> FileStorage {
        FileStorage::new(&UploadConfig {
            root_dir: dir.path().to_string_lossy().into_owned(),
            public_prefix: "/uploads/".to_string(),
            max_photo_bytes,
        })
    }

    #[tokio::test]
    async fn test_staged_file_not_public_until_promoted() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, 1024);

        let staged = storage.save_upload(b"jpeg-bytes", "jpg").await.unwrap();
        let public_path = dir.path().join(PUBLIC_DIR).join(staged.file_name());
        assert!(!public_path.exists());

        storage.promote(&staged).await.unwrap();
        assert!(public_path.exists());
        assert!(!staged.staged_path.exists());
        assert_eq!(
            storage.public_url(&staged),
            format!("/uploads/reception/{}", staged.file_name())
        );
    }

    #[tokio::test]
    async fn test_discard_removes_staged_files() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, 1024);

        let staged = storage.save_upload(b"png", "png").await.unwrap();
        let path = staged.staged_path.clone();
        storage.discard(&[staged]).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_oversized_and_empty_uploads_rejected() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, 4);

        assert!(storage.save_upload(b"", "jpg").await.is_err());
        assert!(storage.save_upload(b"12345", "jpg").await.is_err());
    }

    #[test]
    fn test_public_location_matches_urls() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, 1024);

        assert_eq!(storage.public_route(), "/uploads/reception");
        assert_eq!(storage.public_dir(), dir.path().join(PUBLIC_DIR));
    }

    #[tokio::test]
    async fn test_delete_file_by_url() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, 1024);

        let staged = storage.save_upload(b"webp", "webp").await.unwrap();
        storage.promote(&staged).await.unwrap();
        let url = storage.public_url(&staged);

        storage.delete_file(&url).await.unwrap();
        assert!(!storage.public_dir().join(staged.file_name()).exists());
        assert!(storage.delete_file("/uploads/reception/../secret").await.is_err());
        assert!(storage.delete_file("/elsewhere/photo.jpg").await.is_err());
    }
}
