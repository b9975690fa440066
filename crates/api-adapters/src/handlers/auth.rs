use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use domains::PublicUser;
use validator::Validate;

use crate::dto::{SessionResponse, SigninRequest, SignupRequest, UserResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    let session = state
        .users
        .signup(&req.name, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    let session = state.users.signin(&req.email, &req.password).await?;
    Ok(Json(session.into()))
}

/// Echoes the user behind the bearer token.
pub async fn validate(Extension(user): Extension<PublicUser>) -> Json<UserResponse> {
    Json(UserResponse { user })
}
