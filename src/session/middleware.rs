use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::types::CurrentUser;
use crate::shared::{AppError, AppState};

/// Authentication middleware for protected routes.
///
/// Verification pipeline, short-circuiting on first failure:
/// 1. extract the bearer token from the Authorization header,
/// 2. verify signature and expiry,
/// 3. reject revoked `jti`s (body is exactly `revoked token`),
/// 4. resolve the token's subject against the user store.
///
/// On success the resolved user and the claims land in request extensions;
/// handlers extract `Extension<CurrentUser>` / `Extension<SessionClaims>`.
/// Usage: `.route_layer(middleware::from_fn_with_state(state, session::jwt_auth))`
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    debug!(uri = %req.uri(), "Authenticating request");

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = state.token_config.verify(token).inspect_err(|e| {
        warn!("Token verification failed: {}", e);
    })?;

    if state.deny_list.is_revoked(&claims.jti).await? {
        warn!(jti = %claims.jti, "Rejected revoked token");
        return Err(AppError::RevokedToken);
    }

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = claims.sub, "Token subject no longer exists");
            AppError::Unauthorized("Unknown user".to_string())
        })?;

    debug!(
        user_id = user.id,
        jti = %claims.jti,
        "Authentication successful, adding identity to request"
    );

    req.extensions_mut().insert(CurrentUser(user));
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
