//! # Postgres repositories
//!
//! Maps the relational model to domain models with runtime-checked sqlx
//! queries. The unique indexes on `posts.slug` and `users.email` are the
//! authoritative uniqueness checks; violations come back as `Conflict`.

use async_trait::async_trait;
use domains::{
    AppError, NewPost, NewUser, Page, Post, PostPatch, PostRepository, PostStatus,
    PostWithAuthor, Result, User, UserRepository, Visibility,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.body, p.tags, p.status, p.cover, \
                            p.author_id, p.created_at, p.updated_at";

/// Opens a pool and applies the embedded migrations.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(map_sqlx)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(max_connections, "postgres pool ready, migrations applied");
    Ok(pool)
}

fn map_sqlx(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(db.message().to_string())
        }
        _ => AppError::Internal(format!("database: {err}")),
    }
}

fn post_from_row(row: &PgRow) -> Result<Post> {
    let status: String = row.try_get("status").map_err(map_sqlx)?;
    Ok(Post {
        id: row.try_get("id").map_err(map_sqlx)?,
        title: row.try_get("title").map_err(map_sqlx)?,
        slug: row.try_get("slug").map_err(map_sqlx)?,
        body: row.try_get("body").map_err(map_sqlx)?,
        tags: row.try_get("tags").map_err(map_sqlx)?,
        status: status.parse::<PostStatus>()?,
        cover: row.try_get("cover").map_err(map_sqlx)?,
        author_id: row.try_get("author_id").map_err(map_sqlx)?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx)?,
    })
}

fn post_with_author_from_row(row: &PgRow) -> Result<PostWithAuthor> {
    Ok(PostWithAuthor {
        post: post_from_row(row)?,
        author_name: row.try_get("author_name").map_err(map_sqlx)?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id").map_err(map_sqlx)?,
        name: row.try_get("name").map_err(map_sqlx)?,
        email: row.try_get("email").map_err(map_sqlx)?,
        password_hash: row.try_get("password_hash").map_err(map_sqlx)?,
        active: row.try_get("active").map_err(map_sqlx)?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostWithAuthor>> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, u.name AS author_name \
             FROM posts p LEFT JOIN users u ON u.id = p.author_id \
             WHERE p.slug = $1"
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(post_with_author_from_row).transpose()
    }

    async fn insert(&self, post: NewPost) -> Result<Post> {
        let sql = format!(
            "INSERT INTO posts AS p (id, author_id, slug, title, body, tags, status, cover) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::now_v7())
            .bind(post.author_id)
            .bind(&post.slug)
            .bind(&post.title)
            .bind(&post.body)
            .bind(&post.tags)
            .bind(PostStatus::Draft.as_str())
            .bind(&post.cover)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        post_from_row(&row)
    }

    async fn update(&self, slug: &str, patch: PostPatch) -> Result<Post> {
        let sql = format!(
            "UPDATE posts AS p SET \
                 status = COALESCE($2, p.status), \
                 title = COALESCE($3, p.title), \
                 body = COALESCE($4, p.body), \
                 tags = COALESCE($5, p.tags), \
                 cover = COALESCE($6, p.cover), \
                 updated_at = now() \
             WHERE p.slug = $1 \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.title)
            .bind(patch.body)
            .bind(patch.tags)
            .bind(patch.cover)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        match row {
            Some(row) => post_from_row(&row),
            None => Err(AppError::not_found_post(slug)),
        }
    }

    async fn delete(&self, slug: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found_post(slug));
        }
        Ok(())
    }

    async fn list(&self, visibility: Visibility, page: Page) -> Result<Vec<PostWithAuthor>> {
        let published_only = visibility == Visibility::PublishedOnly;
        let sql = format!(
            "SELECT {POST_COLUMNS}, u.name AS author_name \
             FROM posts p LEFT JOIN users u ON u.id = p.author_id \
             WHERE (NOT $1 OR p.status = 'PUBLISHED') \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(published_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(post_with_author_from_row).collect()
    }

    async fn list_related(
        &self,
        exclude_slug: &str,
        tags: Vec<String>,
        page: Page,
    ) -> Result<Vec<PostWithAuthor>> {
        // strpos rather than ILIKE so `%` and `_` inside tags match literally.
        let sql = format!(
            "SELECT {POST_COLUMNS}, u.name AS author_name \
             FROM posts p LEFT JOIN users u ON u.id = p.author_id \
             WHERE p.status = 'PUBLISHED' \
               AND p.slug <> $1 \
               AND EXISTS ( \
                   SELECT 1 FROM unnest($2::text[]) AS t(tag) \
                   WHERE strpos(lower(p.tags), lower(t.tag)) > 0 \
               ) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query(&sql)
            .bind(exclude_slug)
            .bind(tags)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(post_with_author_from_row).collect()
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, active, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email, password_hash, active, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match map_sqlx(err) {
            AppError::Conflict(_) => AppError::Conflict("Failed to create new user.".to_string()),
            other => other,
        })?;
        user_from_row(&row)
    }
}
