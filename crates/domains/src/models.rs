//! # Domain Models
//!
//! These structs represent the core entities of rusty-blog.
//! Posts and users use UUID v7 for time-ordered identification; cover
//! filenames use UUID v4 so they carry no ordering information.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Number of posts returned by every paginated listing.
pub const ITEMS_PER_PAGE: u32 = 5;

/// Publication state of a post. New posts start as drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "DRAFT",
            PostStatus::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(PostStatus::Draft),
            "PUBLISHED" => Ok(PostStatus::Published),
            other => Err(AppError::ValidationError(format!(
                "status must be DRAFT or PUBLISHED, got '{other}'"
            ))),
        }
    }
}

/// A blog post as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// Unique, derived from the title at creation and never re-derived
    pub slug: String,
    pub body: String,
    /// Comma-joined tag list, stored exactly as entered
    pub tags: String,
    pub status: PostStatus,
    /// Bare filename of the cover asset, if any
    pub cover: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Tags split on `,`, trimmed, with empty entries dropped.
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A post joined with its author's display name. Every read returns this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author_name: Option<String>,
}

/// Fields for a post insert. The repository assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub author_id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub tags: String,
    pub cover: Option<String>,
}

/// Partial update. `None` leaves the column untouched; slug is not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPatch {
    pub status: Option<PostStatus>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<String>,
    pub cover: Option<String>,
}

/// Which posts a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    PublishedOnly,
}

/// A 1-based page number. Construction rejects zero and negatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(u32);

impl Page {
    pub fn new(number: i64) -> Result<Self, AppError> {
        if number <= 0 || number > u32::MAX as i64 {
            return Err(AppError::ValidationError(
                "This page does not exist.".to_string(),
            ));
        }
        Ok(Page(number as u32))
    }

    pub fn first() -> Self {
        Page(1)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    pub fn limit(&self) -> i64 {
        ITEMS_PER_PAGE as i64
    }

    pub fn offset(&self) -> i64 {
        (self.0 as i64 - 1) * ITEMS_PER_PAGE as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::first()
    }
}

/// An admin account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Always stored lowercase
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// What the API is allowed to show about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A file received from a client, parked on disk for the duration of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub path: PathBuf,
    /// Media type as declared by the client (not sniffed)
    pub media_type: String,
    pub original_name: Option<String>,
}

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// A stored, re-encoded cover image, identified by its bare filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoverAsset(String);

impl CoverAsset {
    pub fn new(filename: impl Into<String>) -> Self {
        CoverAsset(filename.into())
    }

    pub fn filename(&self) -> &str {
        &self.0
    }

    pub fn into_filename(self) -> String {
        self.0
    }
}

impl fmt::Display for CoverAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why an upload was refused. `reason()` strings are stable and client-facing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverRejection {
    UnsupportedType(String),
    InvalidSize { width: u32, height: u32 },
    Undecodable,
}

impl CoverRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            CoverRejection::UnsupportedType(_) => "unsupported type",
            CoverRejection::InvalidSize { .. } => "invalid size",
            CoverRejection::Undecodable => "undecodable image",
        }
    }
}

impl fmt::Display for CoverRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Result of running an upload through the cover pipeline.
/// A rejection is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverOutcome {
    Stored(CoverAsset),
    Rejected(CoverRejection),
}

/// Where a swallowed cleanup failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupTarget {
    /// A temporary upload
    Temp,
    /// A stored cover asset
    Cover,
}

impl CleanupTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupTarget::Temp => "temp",
            CleanupTarget::Cover => "cover",
        }
    }
}
