//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Mocks are generated with mockall when the `testing` feature is on.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    CleanupTarget, ImageDimensions, NewPost, NewUser, Page, Post, PostPatch, PostWithAuthor,
    User, Visibility,
};

/// Data persistence contract for posts.
///
/// `insert` must reject a slug that already exists with `AppError::Conflict`;
/// that rejection is the authoritative uniqueness check.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostWithAuthor>>;
    async fn insert(&self, post: NewPost) -> Result<Post>;
    async fn update(&self, slug: &str, patch: PostPatch) -> Result<Post>;
    async fn delete(&self, slug: &str) -> Result<()>;

    /// Newest first.
    async fn list(&self, visibility: Visibility, page: Page) -> Result<Vec<PostWithAuthor>>;

    /// Published posts other than `exclude_slug` whose tags contain any of
    /// `tags` (case-insensitive substring match). Newest first.
    async fn list_related(
        &self,
        exclude_slug: &str,
        tags: Vec<String>,
        page: Page,
    ) -> Result<Vec<PostWithAuthor>>;
}

/// Data persistence contract for admin accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// `email` is expected lowercase.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Rejects a duplicate email with `AppError::Conflict`.
    async fn insert(&self, user: NewUser) -> Result<User>;
}

/// Filesystem contract for cover assets and temporary uploads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Writes a cover asset under the covers directory.
    async fn write_cover(&self, filename: &str, data: Bytes) -> Result<()>;
    /// Deletes a cover asset by bare filename.
    async fn delete_cover(&self, filename: &str) -> Result<()>;
    /// Deletes a temporary upload.
    async fn delete_temp(&self, path: &Path) -> Result<()>;
}

/// Why a transcoder could not handle a file.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    /// The bytes are not an image the decoder understands
    #[error("undecodable image: {0}")]
    Undecodable(String),
    /// Reading the source or encoding the output failed
    #[error("transcode failed: {0}")]
    Failed(String),
}

/// Image decoding and canonical re-encoding.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageTranscoder: Send + Sync {
    /// Reads pixel dimensions without keeping the decoded image.
    async fn inspect(&self, path: &Path) -> std::result::Result<ImageDimensions, TranscodeError>;

    /// Re-encodes the image at `path` into the canonical lossy format.
    async fn transcode(
        &self,
        path: &Path,
        quality: f32,
    ) -> std::result::Result<Bytes, TranscodeError>;

    /// File extension of the canonical format, without the dot.
    fn extension(&self) -> &'static str;
}

/// Source of unique opaque tokens for asset filenames.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenSource: Send + Sync {
    fn token(&self) -> String;
}

/// Observability sink for the cover pipeline. Cleanup failures are
/// swallowed by the pipeline and only surface here.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PipelineReporter: Send + Sync {
    fn cleanup_failed(&self, target: CleanupTarget, location: &str, error: &str);
    /// `outcome` is `"stored"` or a rejection reason.
    fn cover_processed(&self, outcome: &str);
}

/// Password hashing contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Bearer token issuance and verification.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: Uuid) -> Result<String>;
    /// Returns the user id the token was issued for.
    fn verify(&self, token: &str) -> Result<Uuid>;
}
