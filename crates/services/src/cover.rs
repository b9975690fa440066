//! # Cover Processor
//!
//! Turns an uploaded file into a stored cover asset, or a rejection.
//!
//! type gate → inspect → dimension gate → re-encode → write under a random
//! name. The temporary upload is deleted on every exit path, and cleanup
//! failures never reach the caller.

use std::sync::Arc;

use domains::{
    AppError, CleanupTarget, CoverAsset, CoverOutcome, CoverRejection, ImageDimensions,
    ImageTranscoder, MediaStorage, PipelineReporter, Result, TokenSource, TranscodeError,
    UploadedFile,
};
use uuid::Uuid;

/// Bounds and encoding settings applied to every cover.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverPolicy {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    /// Lossy encoder quality, 0-100
    pub quality: f32,
}

impl Default for CoverPolicy {
    fn default() -> Self {
        Self {
            min_width: 600,
            max_width: 1200,
            min_height: 400,
            max_height: 1200,
            quality: 85.0,
        }
    }
}

impl CoverPolicy {
    /// Both bounds inclusive.
    pub fn fits(&self, dims: ImageDimensions) -> bool {
        (self.min_width..=self.max_width).contains(&dims.width)
            && (self.min_height..=self.max_height).contains(&dims.height)
    }
}

/// Declared media types the pipeline accepts: JPEG (and its `jpg` alias) and PNG.
/// The declaration is trusted as-is; content is never sniffed.
pub fn is_accepted_media_type(declared: &str) -> bool {
    let Ok(parsed) = declared.trim().parse::<mime::Mime>() else {
        return false;
    };
    if !parsed.type_().as_str().eq_ignore_ascii_case("image") {
        return false;
    }
    let subtype = parsed.subtype().as_str().to_ascii_lowercase();
    matches!(subtype.as_str(), "jpeg" | "jpg" | "png")
}

/// Random 128-bit-class filenames (UUID v4, 122 random bits).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenSource;

impl TokenSource for UuidTokenSource {
    fn token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Reporter for wiring without a metrics registry. The processor's own
/// tracing events still fire.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl PipelineReporter for NoopReporter {
    fn cleanup_failed(&self, _target: CleanupTarget, _location: &str, _error: &str) {}
    fn cover_processed(&self, _outcome: &str) {}
}

pub struct CoverProcessor {
    storage: Arc<dyn MediaStorage>,
    transcoder: Arc<dyn ImageTranscoder>,
    tokens: Arc<dyn TokenSource>,
    reporter: Arc<dyn PipelineReporter>,
    policy: CoverPolicy,
}

impl CoverProcessor {
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        transcoder: Arc<dyn ImageTranscoder>,
        tokens: Arc<dyn TokenSource>,
        reporter: Arc<dyn PipelineReporter>,
        policy: CoverPolicy,
    ) -> Self {
        Self {
            storage,
            transcoder,
            tokens,
            reporter,
            policy,
        }
    }

    /// Runs an upload through the pipeline. The temp file at `file.path` is
    /// gone when this returns, whatever the outcome.
    ///
    /// `Ok(CoverOutcome::Rejected(_))` is a validation outcome; `Err` means
    /// the encode or the write failed.
    pub async fn process(&self, file: UploadedFile) -> Result<CoverOutcome> {
        let outcome = self.run(&file).await;
        self.discard_upload(&file).await;

        match &outcome {
            Ok(CoverOutcome::Stored(asset)) => {
                tracing::info!(cover = %asset, "cover stored");
                self.reporter.cover_processed("stored");
            }
            Ok(CoverOutcome::Rejected(rejection)) => {
                tracing::debug!(
                    media_type = %file.media_type,
                    original_name = ?file.original_name,
                    reason = rejection.reason(),
                    "cover rejected"
                );
                self.reporter.cover_processed(rejection.reason());
            }
            Err(err) => {
                tracing::error!(error = %err, "cover processing failed");
                self.reporter.cover_processed("error");
            }
        }
        outcome
    }

    async fn run(&self, file: &UploadedFile) -> Result<CoverOutcome> {
        if !is_accepted_media_type(&file.media_type) {
            return Ok(CoverOutcome::Rejected(CoverRejection::UnsupportedType(
                file.media_type.clone(),
            )));
        }

        let dims = match self.transcoder.inspect(&file.path).await {
            Ok(dims) => dims,
            Err(TranscodeError::Undecodable(_)) => {
                return Ok(CoverOutcome::Rejected(CoverRejection::Undecodable))
            }
            Err(err @ TranscodeError::Failed(_)) => return Err(AppError::internal(err)),
        };

        if !self.policy.fits(dims) {
            return Ok(CoverOutcome::Rejected(CoverRejection::InvalidSize {
                width: dims.width,
                height: dims.height,
            }));
        }

        let encoded = match self
            .transcoder
            .transcode(&file.path, self.policy.quality)
            .await
        {
            Ok(bytes) => bytes,
            Err(TranscodeError::Undecodable(_)) => {
                return Ok(CoverOutcome::Rejected(CoverRejection::Undecodable))
            }
            Err(err @ TranscodeError::Failed(_)) => return Err(AppError::internal(err)),
        };

        let filename = format!("{}.{}", self.tokens.token(), self.transcoder.extension());
        self.storage.write_cover(&filename, encoded).await?;

        Ok(CoverOutcome::Stored(CoverAsset::new(filename)))
    }

    /// Best-effort removal of a stored cover (post deleted, cover replaced,
    /// insert failed). Never fails.
    pub async fn discard_cover(&self, filename: &str) {
        if let Err(err) = self.storage.delete_cover(filename).await {
            tracing::warn!(cover = filename, error = %err, "failed to delete cover asset");
            self.reporter
                .cleanup_failed(CleanupTarget::Cover, filename, &err.to_string());
        }
    }

    /// Deletes an upload's temp file without processing it (the request
    /// failed before the pipeline ran). Never fails.
    pub async fn discard_upload(&self, file: &UploadedFile) {
        if let Err(err) = self.storage.delete_temp(&file.path).await {
            let location = file.path.display().to_string();
            tracing::warn!(path = %location, error = %err, "failed to delete temporary upload");
            self.reporter
                .cleanup_failed(CleanupTarget::Temp, &location, &err.to_string());
        }
    }
}
