//! # WebP transcoder
//!
//! `ImageTranscoder` backed by the `image` crate for decoding and libwebp
//! (through the `webp` crate) for lossy encoding, since `image` itself only
//! writes lossless WebP.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{ImageDimensions, ImageTranscoder, TranscodeError};
use image::{DynamicImage, ImageError, ImageReader};

#[derive(Debug, Default, Clone, Copy)]
pub struct WebpTranscoder;

impl WebpTranscoder {
    pub fn new() -> Self {
        Self
    }
}

fn open(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, TranscodeError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| TranscodeError::Failed(format!("reading {}: {e}", path.display())))
}

fn classify(err: ImageError) -> TranscodeError {
    match err {
        ImageError::IoError(io) => TranscodeError::Failed(io.to_string()),
        other => TranscodeError::Undecodable(other.to_string()),
    }
}

fn read_dimensions(path: &Path) -> Result<ImageDimensions, TranscodeError> {
    let (width, height) = open(path)?.into_dimensions().map_err(classify)?;
    Ok(ImageDimensions { width, height })
}

fn encode_webp(image: &DynamicImage, quality: f32) -> Bytes {
    let rgba = image.to_rgba8();
    let encoded = webp::Encoder::from_rgba(&rgba, rgba.width(), rgba.height()).encode(quality);
    Bytes::copy_from_slice(&encoded)
}

fn transcode_file(path: &Path, quality: f32) -> Result<Bytes, TranscodeError> {
    let image = open(path)?.decode().map_err(classify)?;
    Ok(encode_webp(&image, quality))
}

/// Decoding and encoding are CPU-bound; both run on the blocking pool.
async fn blocking<T, F>(path: &Path, work: F) -> Result<T, TranscodeError>
where
    T: Send + 'static,
    F: FnOnce(PathBuf) -> Result<T, TranscodeError> + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || work(path))
        .await
        .map_err(|e| TranscodeError::Failed(format!("image task aborted: {e}")))?
}

#[async_trait]
impl ImageTranscoder for WebpTranscoder {
    async fn inspect(&self, path: &Path) -> Result<ImageDimensions, TranscodeError> {
        blocking(path, |p| read_dimensions(&p)).await
    }

    async fn transcode(&self, path: &Path, quality: f32) -> Result<Bytes, TranscodeError> {
        blocking(path, move |p| transcode_file(&p, quality)).await
    }

    fn extension(&self) -> &'static str {
        "webp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn write_image(dir: &Path, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save_with_format(&path, format).unwrap();
        path
    }

    #[tokio::test]
    async fn inspects_png_and_jpeg_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_image(dir.path(), "a", 640, 480, ImageFormat::Png);
        let jpeg = write_image(dir.path(), "b", 1200, 400, ImageFormat::Jpeg);

        let transcoder = WebpTranscoder::new();
        assert_eq!(
            transcoder.inspect(&png).await.unwrap(),
            ImageDimensions { width: 640, height: 480 }
        );
        assert_eq!(
            transcoder.inspect(&jpeg).await.unwrap(),
            ImageDimensions { width: 1200, height: 400 }
        );
    }

    #[tokio::test]
    async fn garbage_is_undecodable_and_missing_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk");
        std::fs::write(&junk, b"definitely not an image").unwrap();

        let transcoder = WebpTranscoder::new();
        assert!(matches!(
            transcoder.inspect(&junk).await,
            Err(TranscodeError::Undecodable(_))
        ));
        assert!(matches!(
            transcoder.inspect(&dir.path().join("missing")).await,
            Err(TranscodeError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn transcode_produces_webp_with_same_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_image(dir.path(), "c", 800, 600, ImageFormat::Png);

        let bytes = WebpTranscoder::new().transcode(&png, 85.0).await.unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");

        let decoded = webp::Decoder::new(&bytes).decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }
}
