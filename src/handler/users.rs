// handler/users.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::marketdtos::{ApiResponse, RateUserDto, UpdateProfileDto},
    error::HttpError,
    middleware::AuthenticatedCaller,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/profile", put(update_profile))
        .route("/:user_id/profile", get(get_profile))
        .route("/:user_id/ratings", post(rate_user))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .user_service
        .update_user_profile(caller.id, &body.name, &body.skills)
        .await?;

    Ok(Json(ApiResponse::success("Profile updated successfully", profile)))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.user_service.get_user_profile(user_id).await?;

    Ok(Json(ApiResponse::success("Profile retrieved successfully", profile)))
}

pub async fn rate_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<RateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .user_service
        .rate_user(caller.id, user_id, body.score)
        .await?;

    Ok(Json(ApiResponse::success("Rating recorded", profile)))
}
