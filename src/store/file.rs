// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local persistent key/value backend.
//!
//! Values live in one JSON object. Writes go to a sibling temporary file
//! that is fsynced and then renamed over the original.

use super::CredentialBackend;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<BTreeMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::StorageUnavailable(format!(
                    "corrupt credential file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }

    async fn write_document(&self, doc: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");

        let mut file = open_private(&tmp).await?;
        file.write_all(&bytes)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        file.sync_all().await.map_err(|e| io_error(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))
    }
}

#[async_trait]
impl CredentialBackend for FileBackend {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_document().await?.remove(key))
    }

    async fn store(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut doc = self.read_document().await?;
        let changed = match value {
            Some(v) => doc.insert(key.to_string(), v.to_string()).as_deref() != Some(v),
            None => doc.remove(key).is_some(),
        };
        if !changed {
            return Ok(());
        }
        self.write_document(&doc).await?;
        tracing::debug!(path = %self.path.display(), key, "Credential file updated");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(unix)]
async fn open_private(path: &Path) -> Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await
        .map_err(|e| io_error(path, e))
}

#[cfg(not(unix))]
async fn open_private(path: &Path) -> Result<fs::File> {
    fs::File::create(path).await.map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> AppError {
    tracing::error!(path = %path.display(), error = %err, "Credential file I/O failed");
    AppError::StorageUnavailable(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_absence() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("creds.json"));
        assert_eq!(backend.load("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");

        FileBackend::new(&path)
            .store("token", Some("T1"))
            .await
            .unwrap();

        let reopened = FileBackend::new(&path);
        assert_eq!(reopened.load("token").await.unwrap().as_deref(), Some("T1"));

        reopened.store("token", None).await.unwrap();
        assert_eq!(FileBackend::new(&path).load("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, b"{not json").unwrap();

        let backend = FileBackend::new(&path);
        assert!(matches!(
            backend.load("token").await,
            Err(AppError::StorageUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        FileBackend::new(&path)
            .store("token", Some("T1"))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
