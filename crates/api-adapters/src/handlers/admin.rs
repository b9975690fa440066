//! Authenticated post management. Every route here sits behind
//! `require_bearer`, which puts the caller's `PublicUser` in the extensions.

use axum::{
    extract::{rejection::QueryRejection, Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use domains::{PostStatus, PublicUser};
use services::EditPost;
use validator::Validate;

use super::page_from;
use crate::dto::{CreatePostFields, PageQuery, PostListResponse, PostResponse};
use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::PostForm;

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PostListResponse>, ApiError> {
    let page = page_from(query?)?;
    let posts = state.posts.list_all(page).await?;
    Ok(Json(PostListResponse {
        page: page.number(),
        posts: posts
            .into_iter()
            .map(|p| PostResponse::from_joined(p, &state.http))
            .collect(),
    }))
}

pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.posts.get(&slug).await?;
    Ok(Json(PostResponse::from_joined(post, &state.http)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let mut form = PostForm::read(multipart, &state.http.uploads_dir).await?;
    let fields = CreatePostFields {
        title: form.take("title"),
        body: form.take("body"),
        tags: form.take("tags"),
    };
    if let Err(errors) = fields.validate() {
        form.discard_cover().await;
        return Err(errors.into());
    }

    let post = state
        .posts
        .create(user.id, fields.into(), form.cover.take())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PostResponse::new(post, Some(user.name), &state.http)),
    ))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<PostResponse>, ApiError> {
    let mut form = PostForm::read(multipart, &state.http.uploads_dir).await?;

    let status = match form.take("status").map(|s| s.parse::<PostStatus>()).transpose() {
        Ok(status) => status,
        Err(err) => {
            form.discard_cover().await;
            return Err(err.into());
        }
    };
    let input = EditPost {
        status,
        title: form.take("title"),
        body: form.take("body"),
        tags: form.take("tags"),
    };

    let post = state.posts.edit(&slug, input, form.cover.take()).await?;
    Ok(Json(PostResponse::from_joined(post, &state.http)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.posts.remove(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
