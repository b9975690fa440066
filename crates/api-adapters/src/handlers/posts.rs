//! Public, read-only post endpoints. Drafts are invisible here.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};

use super::page_from;
use crate::dto::{PageQuery, PostListResponse, PostResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PostListResponse>, ApiError> {
    let page = page_from(query?)?;
    let posts = state.posts.list_published(page).await?;
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
    let post = state.posts.get_published(&slug).await?;
    Ok(Json(PostResponse::from_joined(post, &state.http)))
}

pub async fn related(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PostListResponse>, ApiError> {
    let page = page_from(query?)?;
    let posts = state.posts.related(&slug, page).await?;
    Ok(Json(PostListResponse {
        page: page.number(),
        posts: posts
            .into_iter()
            .map(|p| PostResponse::from_joined(p, &state.http))
            .collect(),
    }))
}
