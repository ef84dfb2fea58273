use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::RegistrationService,
    types::{
        ConfirmQuery, ConfirmationRequest, ListedUser, PageQuery, SignupRequest,
        UpdateRequest, UserResponse, UsersPage, PER_PAGE,
    },
};
use crate::session::CurrentUser;
use crate::shared::{AppError, AppState};

fn registration_service(state: &AppState) -> RegistrationService {
    RegistrationService::new(Arc::clone(&state.user_repository), Arc::clone(&state.mailer))
}

/// HTTP handler for POST /api/signup
///
/// Creates an unconfirmed account and triggers the confirmation email
#[instrument(name = "signup", skip(state, request))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = registration_service(&state).signup(request.user).await?;

    info!(user_id = user.id, "Signup succeeded");
    Ok(Json(UserResponse::from(&user)))
}

/// HTTP handler for PUT /api/signup (profile update, protected)
#[instrument(name = "update_profile", skip(state, current, request))]
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = registration_service(&state)
        .update(&current.0, request.user)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// HTTP handler for POST /confirmation (re-send the confirmation link)
#[instrument(name = "resend_confirmation", skip(state, request))]
pub async fn resend_confirmation(
    State(state): State<AppState>,
    Json(request): Json<ConfirmationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    registration_service(&state)
        .resend_confirmation(&request.user.email)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Confirmation instructions sent"
    })))
}

/// HTTP handler for GET /confirmation (the emailed link's target)
#[instrument(name = "confirm", skip(state, query))]
pub async fn confirm(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<UserResponse>, AppError> {
    let user = registration_service(&state)
        .confirm(&query.confirmation_token)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// HTTP handler for GET /users (public, paginated)
///
/// Entries carry id and name only; the page envelope includes pagination
/// metadata and a next-page link while further pages exist.
#[instrument(name = "list_users", skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UsersPage>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let total_count = state.user_repository.count_users().await?;
    // Saturate: an absurd page number is just an empty page, not an
    // overflow or a negative offset
    let offset = (page - 1).saturating_mul(PER_PAGE);
    let users = state
        .user_repository
        .list_users(offset, PER_PAGE)
        .await?;

    let listed = users.iter().map(ListedUser::from).collect();
    Ok(Json(UsersPage::new(listed, page, total_count)))
}

/// HTTP handler for GET /users/:id (protected)
///
/// Returns the full record including email, for any user id
#[instrument(name = "show_user", skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}
