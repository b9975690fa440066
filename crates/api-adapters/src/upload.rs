//! Multipart form reading for the admin post endpoints.
//!
//! Text fields are collected in memory. The `cover` file part is streamed to
//! a uniquely named file under the uploads directory; from then on the cover
//! pipeline (or `PostForm::discard_cover`) owns its deletion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use domains::UploadedFile;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::ApiError;

pub const COVER_FIELD: &str = "cover";

#[derive(Debug, Default)]
pub struct PostForm {
    fields: HashMap<String, String>,
    pub cover: Option<UploadedFile>,
}

impl PostForm {
    pub async fn read(mut multipart: Multipart, uploads_dir: &Path) -> Result<Self, ApiError> {
        let mut form = PostForm::default();
        if let Err(err) = form.fill(&mut multipart, uploads_dir).await {
            form.discard_cover().await;
            return Err(err);
        }
        Ok(form)
    }

    async fn fill(&mut self, multipart: &mut Multipart, uploads_dir: &Path) -> Result<(), ApiError> {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            // Browsers send an empty, nameless file part when nothing was picked.
            let is_file = field.file_name().is_some_and(|n| !n.is_empty());

            if name == COVER_FIELD && is_file {
                // A second cover part replaces the first.
                self.discard_cover().await;
                self.cover = Some(spool(field, uploads_dir).await?);
            } else if name == COVER_FIELD {
                continue;
            } else {
                let value = field.text().await?;
                self.fields.insert(name, value);
            }
        }
        Ok(())
    }

    /// Removes and returns a text field.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Deletes the spooled cover when the request fails before the pipeline
    /// takes it over.
    pub async fn discard_cover(&mut self) {
        if let Some(cover) = self.cover.take() {
            if let Err(err) = tokio::fs::remove_file(&cover.path).await {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %cover.path.display(),
                        error = %err,
                        "failed to delete unprocessed upload"
                    );
                }
            }
        }
    }
}

async fn spool(mut field: Field<'_>, uploads_dir: &Path) -> Result<UploadedFile, ApiError> {
    let media_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let original_name = field.file_name().map(str::to_string);
    let path: PathBuf = uploads_dir.join(format!("{}.upload", Uuid::new_v4()));

    let written = async {
        let mut file = File::create(&path).await?;
        let mut total = 0usize;
        while let Some(chunk) = field.chunk().await? {
            total += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok::<usize, ApiError>(total)
    }
    .await;

    match written {
        Ok(bytes) => {
            tracing::debug!(path = %path.display(), bytes, %media_type, "upload spooled");
            Ok(UploadedFile {
                path,
                media_type,
                original_name,
            })
        }
        Err(err) => {
            let _ = tokio::fs::remove_file(&path).await;
            Err(err)
        }
    }
}
