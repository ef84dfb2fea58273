// Library crate for the user-account API
// This file exposes the public API for integration tests

pub mod mailer;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use mailer::{ConfirmationMailer, LoggingMailer, RecordingMailer};
pub use session::{CurrentUser, SessionClaims};
pub use shared::{AppError, AppState};
pub use user::models::UserModel;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Builds the full application router.
///
/// Only logout, profile update, and single-user show sit behind the auth
/// middleware; everything else is reachable unauthenticated.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/logout", delete(session::logout))
        .route("/api/signup", put(user::update))
        .route("/users/:id", get(user::show))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::jwt_auth,
        ));

    Router::new()
        .route("/api/login", post(session::login))
        .route("/api/signup", post(user::signup))
        .route("/confirmation", post(user::resend_confirmation).get(user::confirm))
        .route("/users", get(user::index))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
