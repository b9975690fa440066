//! # In-memory repositories
//!
//! DashMap-backed implementation of `PostRepository` and `UserRepository`.
//! Slug and email uniqueness are enforced atomically through the map entry
//! API, mirroring the unique indexes of the Postgres schema.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    AppError, NewPost, NewUser, Page, Post, PostPatch, PostRepository, PostStatus,
    PostWithAuthor, Result, User, UserRepository, Visibility,
};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStore {
    /// Keyed by slug
    posts: DashMap<String, Post>,
    users: DashMap<Uuid, User>,
    /// email -> user id
    emails: DashMap<String, Uuid>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_author(&self, post: Post) -> PostWithAuthor {
        let author_name = self.users.get(&post.author_id).map(|u| u.name.clone());
        PostWithAuthor { post, author_name }
    }

    /// Newest first, then paginated.
    fn page_of<F>(&self, page: Page, keep: F) -> Vec<PostWithAuthor>
    where
        F: Fn(&Post) -> bool,
    {
        let mut matching: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|post| self.with_author(post))
            .collect()
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostWithAuthor>> {
        let found = self.posts.get(slug).map(|p| p.value().clone());
        Ok(found.map(|post| self.with_author(post)))
    }

    async fn insert(&self, new_post: NewPost) -> Result<Post> {
        let now = Utc::now();
        match self.posts.entry(new_post.slug.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "slug '{}' already exists",
                new_post.slug
            ))),
            Entry::Vacant(slot) => {
                let post = Post {
                    id: Uuid::now_v7(),
                    title: new_post.title,
                    slug: new_post.slug,
                    body: new_post.body,
                    tags: new_post.tags,
                    status: PostStatus::Draft,
                    cover: new_post.cover,
                    author_id: new_post.author_id,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(post.clone());
                Ok(post)
            }
        }
    }

    async fn update(&self, slug: &str, patch: PostPatch) -> Result<Post> {
        let mut entry = self
            .posts
            .get_mut(slug)
            .ok_or_else(|| AppError::not_found_post(slug))?;
        let post = entry.value_mut();
        if let Some(status) = patch.status {
            post.status = status;
        }
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(body) = patch.body {
            post.body = body;
        }
        if let Some(tags) = patch.tags {
            post.tags = tags;
        }
        if let Some(cover) = patch.cover {
            post.cover = Some(cover);
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, slug: &str) -> Result<()> {
        self.posts
            .remove(slug)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found_post(slug))
    }

    async fn list(&self, visibility: Visibility, page: Page) -> Result<Vec<PostWithAuthor>> {
        Ok(self.page_of(page, |post| match visibility {
            Visibility::All => true,
            Visibility::PublishedOnly => post.is_published(),
        }))
    }

    async fn list_related(
        &self,
        exclude_slug: &str,
        tags: Vec<String>,
        page: Page,
    ) -> Result<Vec<PostWithAuthor>> {
        let needles: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        Ok(self.page_of(page, |post| {
            let haystack = post.tags.to_lowercase();
            post.is_published()
                && post.slug != exclude_slug
                && needles.iter().any(|tag| haystack.contains(tag.as_str()))
        }))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn insert(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::now_v7(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            active: true,
            created_at: Utc::now(),
        };
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("Failed to create new user.".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(slug: &str, tags: &str) -> NewPost {
        NewPost {
            author_id: Uuid::now_v7(),
            slug: slug.into(),
            title: slug.into(),
            body: "body".into(),
            tags: tags.into(),
            cover: None,
        }
    }

    async fn publish(store: &InMemoryStore, slug: &str) {
        let patch = PostPatch {
            status: Some(PostStatus::Published),
            ..PostPatch::default()
        };
        PostRepository::update(store, slug, patch).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_slug_insert_is_a_conflict() {
        let store = InMemoryStore::new();
        PostRepository::insert(&store, new_post("hello-world", "")).await.unwrap();
        let second = PostRepository::insert(&store, new_post("hello-world", "")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn author_name_is_joined() {
        let store = InMemoryStore::new();
        let ada = UserRepository::insert(
            &store,
            NewUser {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password_hash: "x".into(),
            },
        )
        .await
        .unwrap();
        let mut post = new_post("hello", "");
        post.author_id = ada.id;
        PostRepository::insert(&store, post).await.unwrap();

        let found = store.find_by_slug("hello").await.unwrap().unwrap();
        assert_eq!(found.author_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn update_keeps_slug_and_skips_absent_fields() {
        let store = InMemoryStore::new();
        PostRepository::insert(&store, new_post("keep-me", "a,b")).await.unwrap();
        let patch = PostPatch {
            title: Some("New title".into()),
            ..PostPatch::default()
        };
        let updated = PostRepository::update(&store, "keep-me", patch).await.unwrap();
        assert_eq!(updated.slug, "keep-me");
        assert_eq!(updated.title, "New title");
        assert_eq!(updated.tags, "a,b");
        assert_eq!(updated.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn published_listing_paginates_newest_first() {
        let store = InMemoryStore::new();
        for i in 0..7 {
            let slug = format!("post-{i}");
            PostRepository::insert(&store, new_post(&slug, "")).await.unwrap();
            publish(&store, &slug).await;
        }
        PostRepository::insert(&store, new_post("draft", "")).await.unwrap();

        let first = store.list(Visibility::PublishedOnly, Page::first()).await.unwrap();
        let second = store
            .list(Visibility::PublishedOnly, Page::new(2).unwrap())
            .await
            .unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].post.slug, "post-6");
        assert_eq!(second[1].post.slug, "post-0");

        let all = store.list(Visibility::All, Page::first()).await.unwrap();
        assert_eq!(all[0].post.slug, "draft");
    }

    #[tokio::test]
    async fn related_matches_any_tag_case_insensitively() {
        let store = InMemoryStore::new();
        for (slug, tags) in [
            ("source", "Rust,web"),
            ("rusty", "RUST"),
            ("webby", "frontend,Web"),
            ("other", "cooking"),
        ] {
            PostRepository::insert(&store, new_post(slug, tags)).await.unwrap();
            publish(&store, slug).await;
        }
        PostRepository::insert(&store, new_post("hidden", "rust")).await.unwrap();

        let related = store
            .list_related("source", vec!["Rust".into(), "web".into()], Page::first())
            .await
            .unwrap();
        let mut slugs: Vec<_> = related.iter().map(|p| p.post.slug.as_str()).collect();
        slugs.sort_unstable();
        assert_eq!(slugs, vec!["rusty", "webby"]);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryStore::new();
        let user = NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "x".into(),
        };
        UserRepository::insert(&store, user.clone()).await.unwrap();
        assert!(matches!(
            UserRepository::insert(&store, user).await,
            Err(AppError::Conflict(_))
        ));
        assert!(store.find_by_email("ada@example.com").await.unwrap().is_some());
    }
}
