//! # Slug Resolver
//!
//! Derives a URL-safe slug from a post title and probes the repository until
//! a free one is found: `hello-world`, then `hello-world-2`, `hello-world-3`...
//!
//! The probe is not atomic with the insert that follows it. Two requests with
//! the same title can both see the base slug as free; the repository's unique
//! constraint rejects the second insert with `AppError::Conflict`.

use std::sync::Arc;

use domains::{AppError, PostRepository, Result};

/// Lowercase, ASCII-transliterated, non-alphanumeric runs collapsed to `-`.
pub fn slugify(title: &str) -> String {
    ::slug::slugify(title)
}

pub struct SlugResolver {
    posts: Arc<dyn PostRepository>,
    /// Number of probes allowed, counting the bare base slug
    max_attempts: u32,
}

impl SlugResolver {
    pub fn new(posts: Arc<dyn PostRepository>, max_attempts: u32) -> Self {
        Self {
            posts,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns a slug no existing post uses at the moment of return.
    pub async fn resolve(&self, title: &str) -> Result<String> {
        let base = slugify(title);
        if base.is_empty() {
            return Err(AppError::ValidationError(
                "Title must contain at least one letter or digit.".to_string(),
            ));
        }

        let mut candidate = base.clone();
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                candidate = slugify(&format!("{title} {attempt}"));
            }
            if self.posts.find_by_slug(&candidate).await?.is_none() {
                tracing::debug!(slug = %candidate, attempt, "slug resolved");
                return Ok(candidate);
            }
        }

        tracing::warn!(base = %base, attempts = self.max_attempts, "slug probing exhausted");
        Err(AppError::SlugGenerationExhausted {
            base,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{MockPostRepository, Post, PostStatus, PostWithAuthor};
    use uuid::Uuid;

    fn existing(slug: &str) -> PostWithAuthor {
        PostWithAuthor {
            post: Post {
                id: Uuid::now_v7(),
                title: "Hello World".into(),
                slug: slug.into(),
                body: String::new(),
                tags: String::new(),
                status: PostStatus::Published,
                cover: None,
                author_id: Uuid::now_v7(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            author_name: None,
        }
    }

    fn repo_with(taken: &'static [&'static str]) -> MockPostRepository {
        let mut repo = MockPostRepository::new();
        repo.expect_find_by_slug().returning(move |slug| {
            Ok(taken.iter().any(|t| *t == slug).then(|| existing(slug)))
        });
        repo
    }

    #[test]
    fn slugify_normalizes_separators_and_case() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust -- and   Tokio! "), "rust-and-tokio");
        assert_eq!(slugify("Hello World 2"), "hello-world-2");
        assert_eq!(slugify("Café Crème"), "cafe-creme");
    }

    #[tokio::test]
    async fn free_base_slug_is_returned_as_is() {
        let resolver = SlugResolver::new(Arc::new(repo_with(&[])), 10);
        assert_eq!(resolver.resolve("Hello World").await.unwrap(), "hello-world");
    }

    #[tokio::test]
    async fn first_collision_gets_suffix_two() {
        let resolver = SlugResolver::new(Arc::new(repo_with(&["hello-world"])), 10);
        assert_eq!(resolver.resolve("Hello World").await.unwrap(), "hello-world-2");
    }

    #[tokio::test]
    async fn skips_every_taken_suffix() {
        let resolver = SlugResolver::new(
            Arc::new(repo_with(&["hello-world", "hello-world-2"])),
            10,
        );
        assert_eq!(resolver.resolve("Hello World").await.unwrap(), "hello-world-3");
    }

    #[tokio::test]
    async fn bounded_probing_fails_with_exhaustion() {
        let resolver = SlugResolver::new(
            Arc::new(repo_with(&["hello-world", "hello-world-2", "hello-world-3"])),
            3,
        );
        match resolver.resolve("Hello World").await {
            Err(AppError::SlugGenerationExhausted { base, attempts }) => {
                assert_eq!(base, "hello-world");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn title_without_alphanumerics_is_invalid() {
        let mut repo = MockPostRepository::new();
        repo.expect_find_by_slug().never();
        let resolver = SlugResolver::new(Arc::new(repo), 10);
        assert!(matches!(
            resolver.resolve("!!! ???").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn repository_errors_propagate() {
        let mut repo = MockPostRepository::new();
        repo.expect_find_by_slug()
            .returning(|_| Err(AppError::Internal("connection reset".into())));
        let resolver = SlugResolver::new(Arc::new(repo), 10);
        assert!(matches!(
            resolver.resolve("Hello").await,
            Err(AppError::Internal(_))
        ));
    }
}
