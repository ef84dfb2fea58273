use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::mailer::ConfirmationMailer;
use crate::session::deny_list::TokenDenyList;
use crate::session::token::TokenConfig;
use crate::user::repository::UserRepository;
use crate::user::validation::ValidationErrors;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub deny_list: Arc<dyn TokenDenyList + Send + Sync>,
    pub mailer: Arc<dyn ConfirmationMailer + Send + Sync>,
    pub token_config: TokenConfig,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        deny_list: Arc<dyn TokenDenyList + Send + Sync>,
        mailer: Arc<dyn ConfirmationMailer + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            user_repository,
            deny_list,
            mailer,
            token_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token was explicitly revoked via logout. Kept separate from
    /// `Unauthorized` because the response body must be the exact text
    /// `revoked token`.
    #[error("revoked token")]
    RevokedToken,

    #[error("Validation failed")]
    Validation(ValidationErrors),

    /// Unique violation on the email column. Raised by the store itself so
    /// a signup that races past the pre-insert lookup still surfaces as a
    /// field validation rather than a server error.
    #[error("email has already been taken")]
    EmailTaken,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response()
            }
            // Plain text, not JSON: clients match on this body verbatim
            AppError::RevokedToken => {
                (StatusCode::UNAUTHORIZED, "revoked token").into_response()
            }
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            AppError::EmailTaken => {
                ValidationErrors::single("email", "has already been taken").into_response()
            }
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Database error: {}", msg) })),
            )
                .into_response(),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::mailer::RecordingMailer;
    use crate::session::deny_list::InMemoryTokenDenyList;
    use crate::user::repository::InMemoryUserRepository;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        user_repository: Option<Arc<dyn UserRepository + Send + Sync>>,
        deny_list: Option<Arc<dyn TokenDenyList + Send + Sync>>,
        mailer: Option<Arc<dyn ConfirmationMailer + Send + Sync>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                user_repository: None,
                deny_list: None,
                mailer: None,
            }
        }

        pub fn with_user_repository(
            mut self,
            repo: Arc<dyn UserRepository + Send + Sync>,
        ) -> Self {
            self.user_repository = Some(repo);
            self
        }

        pub fn with_deny_list(mut self, deny_list: Arc<dyn TokenDenyList + Send + Sync>) -> Self {
            self.deny_list = Some(deny_list);
            self
        }

        pub fn with_mailer(mut self, mailer: Arc<dyn ConfirmationMailer + Send + Sync>) -> Self {
            self.mailer = Some(mailer);
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                user_repository: self
                    .user_repository
                    .unwrap_or_else(|| Arc::new(InMemoryUserRepository::new())),
                deny_list: self
                    .deny_list
                    .unwrap_or_else(|| Arc::new(InMemoryTokenDenyList::new())),
                mailer: self
                    .mailer
                    .unwrap_or_else(|| Arc::new(RecordingMailer::new())),
                token_config: TokenConfig::new(),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
