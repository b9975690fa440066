#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use api_adapters::Metrics;
use image::{ImageFormat, RgbImage};
use services::{CoverPolicy, CoverProcessor, UuidTokenSource};
use storage_adapters::{LocalMediaStorage, WebpTranscoder};
use tempfile::TempDir;

/// Scratch directories for one test: `uploads/` and `covers/`.
pub struct MediaDirs {
    _root: TempDir,
    pub uploads: PathBuf,
    pub covers: PathBuf,
}

impl MediaDirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        let covers = root.path().join("covers");
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::create_dir_all(&covers).unwrap();
        Self {
            _root: root,
            uploads,
            covers,
        }
    }

    pub fn cover_files(&self) -> Vec<String> {
        list(&self.covers)
    }

    pub fn upload_files(&self) -> Vec<String> {
        list(&self.uploads)
    }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Encodes a `width` x `height` gradient in `format`.
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Writes an upload the way the HTTP layer would have spooled it.
pub fn spooled(dirs: &MediaDirs, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dirs.uploads.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub async fn processor(dirs: &MediaDirs, metrics: Arc<Metrics>) -> CoverProcessor {
    let storage = LocalMediaStorage::new(&dirs.covers).await.unwrap();
    CoverProcessor::new(
        Arc::new(storage),
        Arc::new(WebpTranscoder::new()),
        Arc::new(UuidTokenSource),
        metrics,
        CoverPolicy::default(),
    )
}
