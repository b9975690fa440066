pub mod admin;
pub mod auth;
pub mod posts;

use axum::extract::Query;
use domains::Page;

use crate::dto::PageQuery;
use crate::error::ApiError;

/// `?page=` defaults to the first page; zero or negative is a 400.
pub(crate) fn page_from(query: Query<PageQuery>) -> Result<Page, ApiError> {
    match query.0.page {
        Some(n) => Ok(Page::new(n)?),
        None => Ok(Page::first()),
    }
}
