//! # AppError
//!
//! Centralized error handling for rusty-blog.
//! Every port returns this type; adapters convert their native errors into it.

use thiserror::Error;

use crate::models::CoverRejection;

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., a post slug)
    #[error("{0}")]
    NotFound(String),

    /// Validation failure (e.g., missing title, page out of range)
    #[error("{0}")]
    ValidationError(String),

    /// The uploaded cover did not pass the pipeline's gates
    #[error("cover rejected: {0}")]
    CoverRejected(CoverRejection),

    /// Security/Auth failure (e.g., bad credentials, expired token)
    #[error("{0}")]
    Unauthorized(String),

    /// Resource already exists (e.g., duplicate slug or email)
    #[error("{0}")]
    Conflict(String),

    /// Every candidate slug up to the configured bound is taken
    #[error("no free slug for '{base}' after {attempts} attempts")]
    SlugGenerationExhausted { base: String, attempts: u32 },

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found_post(slug: &str) -> Self {
        AppError::NotFound(format!("Post '{slug}' does not exist."))
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("io: {err}"))
    }
}

/// A specialized Result type for rusty-blog logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_slug() {
        let err = AppError::not_found_post("hello-world");
        assert_eq!(err.to_string(), "Post 'hello-world' does not exist.");
    }

    #[test]
    fn exhaustion_carries_base_and_attempts() {
        let err = AppError::SlugGenerationExhausted {
            base: "hello".into(),
            attempts: 3,
        };
        assert_eq!(err.to_string(), "no free slug for 'hello' after 3 attempts");
    }

    #[test]
    fn cover_rejection_keeps_its_reason() {
        let err = AppError::CoverRejected(CoverRejection::InvalidSize {
            width: 500,
            height: 500,
        });
        assert_eq!(err.to_string(), "cover rejected: invalid size");
    }
}
