//! # api-adapters
//!
//! The HTTP surface of the blog (feature `web-axum`) plus the Prometheus
//! registry, which is always compiled because the cover pipeline reports
//! into it.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod dto;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod state;
#[cfg(feature = "web-axum")]
pub mod upload;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use router::router;
#[cfg(feature = "web-axum")]
pub use state::{AppState, HttpSettings};

#[cfg(feature = "web-axum")]
mod router {
    use axum::{
        extract::{DefaultBodyLimit, State},
        http::{header, StatusCode},
        middleware::from_fn_with_state,
        response::{IntoResponse, Response},
        routing::get,
        Router,
    };
    use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

    use crate::error::{route_not_found, ApiError};
    use crate::handlers::{admin, auth, posts};
    use crate::middleware::{cors_policy, require_bearer};
    use crate::state::AppState;

    /// Multipart framing and the text fields ride on top of the file itself.
    const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

    /// Builds the full application router.
    ///
    /// ```text
    /// /api/posts                      public listing
    /// /api/posts/{slug}[/related]
    /// /api/auth/{signup,signin,validate}
    /// /api/admin/posts[/{slug}]       bearer only
    /// /images/covers/*                stored covers
    /// /metrics
    /// ```
    pub fn router(state: AppState) -> Router {
        let guard = from_fn_with_state(state.clone(), require_bearer);

        let admin = Router::new()
            .route("/posts", get(admin::list).post(admin::create))
            .route(
                "/posts/{slug}",
                get(admin::show).put(admin::edit).delete(admin::remove),
            )
            .route_layer(guard.clone());

        let api = Router::new()
            .route("/posts", get(posts::list))
            .route("/posts/{slug}", get(posts::show))
            .route("/posts/{slug}/related", get(posts::related))
            .route("/auth/signup", axum::routing::post(auth::signup))
            .route("/auth/signin", axum::routing::post(auth::signin))
            .route("/auth/validate", get(auth::validate).route_layer(guard))
            .nest("/admin", admin);

        let body_limit = state.http.max_upload_bytes + FORM_OVERHEAD_BYTES;

        Router::new()
            .nest("/api", api)
            .route("/metrics", get(metrics))
            .nest_service("/images/covers", ServeDir::new(&state.http.covers_dir))
            .fallback(route_not_found)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(cors_policy(&state.http.cors_origins))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
        let body = state
            .metrics
            .render()
            .map_err(domains::AppError::internal)?;
        Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, crate::metrics::CONTENT_TYPE)],
            body,
        )
            .into_response())
    }
}
