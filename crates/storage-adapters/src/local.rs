//! # Local media storage
//!
//! Filesystem implementation of `MediaStorage`. Covers live flat in one
//! directory under their generated names; temp uploads live wherever the
//! API layer parked them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{AppError, MediaStorage, Result};
use tokio::fs;

pub struct LocalMediaStorage {
    /// Directory holding cover assets (e.g., "./public/images/covers")
    covers_dir: PathBuf,
}

impl LocalMediaStorage {
    /// Creates the covers directory if it does not exist yet.
    pub async fn new(covers_dir: impl Into<PathBuf>) -> Result<Self> {
        let covers_dir = covers_dir.into();
        fs::create_dir_all(&covers_dir).await.map_err(|e| {
            AppError::Internal(format!(
                "failed to create covers directory {}: {e}",
                covers_dir.display()
            ))
        })?;
        Ok(Self { covers_dir })
    }

    pub fn covers_dir(&self) -> &Path {
        &self.covers_dir
    }

    /// Resolves a bare filename inside the covers directory.
    fn cover_path(&self, filename: &str) -> Result<PathBuf> {
        let is_bare = !filename.is_empty()
            && !filename.contains(['/', '\\'])
            && filename != "."
            && filename != "..";
        if !is_bare {
            return Err(AppError::ValidationError(format!(
                "invalid cover filename '{filename}'"
            )));
        }
        Ok(self.covers_dir.join(filename))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    /// Writes to a sibling `.part` file and renames it into place, so readers
    /// never see a half-written cover.
    async fn write_cover(&self, filename: &str, data: Bytes) -> Result<()> {
        let target = self.cover_path(filename)?;
        let partial = self.covers_dir.join(format!("{filename}.part"));

        if let Err(err) = fs::write(&partial, &data).await {
            let _ = fs::remove_file(&partial).await;
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&partial, &target).await {
            let _ = fs::remove_file(&partial).await;
            return Err(err.into());
        }

        tracing::debug!(path = %target.display(), bytes = data.len(), "cover written");
        Ok(())
    }

    async fn delete_cover(&self, filename: &str) -> Result<()> {
        let path = self.cover_path(filename)?;
        fs::remove_file(&path).await?;
        Ok(())
    }

    /// Already-missing files count as deleted.
    async fn delete_temp(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
