//! # Post Service
//!
//! Coordinates the cover pipeline, the slug resolver and the post repository.

use std::sync::Arc;

use domains::{
    AppError, CoverOutcome, NewPost, Page, Post, PostPatch, PostRepository, PostStatus,
    PostWithAuthor, Result, UploadedFile, Visibility,
};
use uuid::Uuid;

use crate::cover::CoverProcessor;
use crate::slug::SlugResolver;

/// Text fields of a new post.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePost {
    pub title: String,
    pub body: String,
    pub tags: String,
}

/// Text fields of an edit; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditPost {
    pub status: Option<PostStatus>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<String>,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    covers: Arc<CoverProcessor>,
    slugs: SlugResolver,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        covers: Arc<CoverProcessor>,
        max_slug_attempts: u32,
    ) -> Self {
        let slugs = SlugResolver::new(posts.clone(), max_slug_attempts);
        Self {
            posts,
            covers,
            slugs,
        }
    }

    /// Creates a draft post. The cover is mandatory.
    pub async fn create(
        &self,
        author_id: Uuid,
        input: CreatePost,
        cover: Option<UploadedFile>,
    ) -> Result<Post> {
        let Some(upload) = cover else {
            return Err(AppError::ValidationError("No file attached.".to_string()));
        };
        let asset = match self.covers.process(upload).await? {
            CoverOutcome::Stored(asset) => asset,
            CoverOutcome::Rejected(rejection) => return Err(AppError::CoverRejected(rejection)),
        };

        let slug = match self.slugs.resolve(&input.title).await {
            Ok(slug) => slug,
            Err(err) => {
                self.covers.discard_cover(asset.filename()).await;
                return Err(err);
            }
        };

        let new_post = NewPost {
            author_id,
            slug,
            title: input.title,
            body: input.body,
            tags: input.tags,
            cover: Some(asset.filename().to_string()),
        };

        match self.posts.insert(new_post).await {
            Ok(post) => {
                tracing::info!(slug = %post.slug, author = %author_id, "post created");
                Ok(post)
            }
            Err(err) => {
                // The asset has no owner if the row never lands.
                self.covers.discard_cover(asset.filename()).await;
                Err(err)
            }
        }
    }

    /// Applies a partial edit. A new cover replaces the old one. A rejected
    /// cover is dropped and the text fields are still applied.
    pub async fn edit(
        &self,
        slug: &str,
        input: EditPost,
        cover: Option<UploadedFile>,
    ) -> Result<PostWithAuthor> {
        let existing = match self.get(slug).await {
            Ok(existing) => existing,
            Err(err) => {
                if let Some(upload) = &cover {
                    self.covers.discard_upload(upload).await;
                }
                return Err(err);
            }
        };

        let new_cover = match cover {
            Some(upload) => match self.covers.process(upload).await? {
                CoverOutcome::Stored(asset) => Some(asset.into_filename()),
                CoverOutcome::Rejected(rejection) => {
                    tracing::debug!(
                        slug,
                        reason = rejection.reason(),
                        "edit keeps the current cover"
                    );
                    None
                }
            },
            None => None,
        };

        let patch = PostPatch {
            status: input.status,
            title: input.title,
            body: input.body,
            tags: input.tags,
            cover: new_cover.clone(),
        };

        let updated = match self.posts.update(slug, patch).await {
            Ok(post) => post,
            Err(err) => {
                if let Some(name) = &new_cover {
                    self.covers.discard_cover(name).await;
                }
                return Err(err);
            }
        };

        if new_cover.is_some() {
            if let Some(old) = existing.post.cover.as_deref() {
                self.covers.discard_cover(old).await;
            }
        }

        tracing::info!(slug = %updated.slug, status = %updated.status, "post updated");
        Ok(PostWithAuthor {
            post: updated,
            author_name: existing.author_name,
        })
    }

    /// Deletes the post, then its cover file (best-effort).
    pub async fn remove(&self, slug: &str) -> Result<()> {
        let existing = self.get(slug).await?;
        self.posts.delete(&existing.post.slug).await?;
        if let Some(cover) = existing.post.cover.as_deref() {
            self.covers.discard_cover(cover).await;
        }
        tracing::info!(slug, "post deleted");
        Ok(())
    }

    /// Any post, whatever its status.
    pub async fn get(&self, slug: &str) -> Result<PostWithAuthor> {
        self.posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found_post(slug))
    }

    /// Drafts are reported as missing.
    pub async fn get_published(&self, slug: &str) -> Result<PostWithAuthor> {
        match self.posts.find_by_slug(slug).await? {
            Some(found) if found.post.is_published() => Ok(found),
            _ => Err(AppError::not_found_post(slug)),
        }
    }

    pub async fn list_all(&self, page: Page) -> Result<Vec<PostWithAuthor>> {
        self.posts.list(Visibility::All, page).await
    }

    pub async fn list_published(&self, page: Page) -> Result<Vec<PostWithAuthor>> {
        self.posts.list(Visibility::PublishedOnly, page).await
    }

    /// Published posts sharing at least one tag with the published post `slug`.
    pub async fn related(&self, slug: &str, page: Page) -> Result<Vec<PostWithAuthor>> {
        let source = self.get_published(slug).await?;
        let tags = source.post.tag_list();
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        self.posts.list_related(slug, tags, page).await
    }
}
