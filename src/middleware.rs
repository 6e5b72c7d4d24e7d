// middleware.rs
use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    utils::token,
    AppState,
};

/// Identity of the authenticated caller, attached to every `/api` request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct AuthenticatedCaller {
    pub id: Uuid,
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer ").map(str::to_owned))
        })
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let subject = token::decode_token(token, app_state.env.jwt_secret.as_bytes())?;

    let id = Uuid::parse_str(&subject).map_err(|_| {
        tracing::warn!("token subject is not an identity");
        HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())
    })?;

    req.extensions_mut().insert(AuthenticatedCaller { id });

    Ok(next.run(req).await)
}
