use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::SessionService,
    types::{LoginRequest, SessionClaims},
};
use crate::shared::{AppError, AppState};
use crate::user::types::UserResponse;

/// HTTP handler for POST /api/login
///
/// On success the bearer token travels in the Authorization response
/// header; the body carries the user representation.
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = SessionService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.deny_list),
        state.token_config.clone(),
    );
    let (token, user) = service
        .login(&request.user.email, &request.user.password)
        .await?;

    info!(user_id = user.id, "Login succeeded");

    Ok((
        AppendHeaders([(header::AUTHORIZATION, format!("Bearer {token}"))]),
        Json(UserResponse::from(&user)),
    ))
}

/// HTTP handler for DELETE /api/logout
///
/// Protected route: the middleware has already authenticated the token, so
/// the claims extension is always present here.
#[instrument(name = "logout", skip(state, claims))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<StatusCode, AppError> {
    let service = SessionService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.deny_list),
        state.token_config.clone(),
    );
    service.logout(&claims).await?;

    Ok(StatusCode::NO_CONTENT)
}
