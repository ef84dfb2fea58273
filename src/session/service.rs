use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{deny_list::TokenDenyList, token::TokenConfig, types::SessionClaims};
use crate::user::models::UserModel;
use crate::user::password;
use crate::user::repository::UserRepository;
use crate::shared::AppError;

// One message for unknown email and wrong password alike, so responses
// don't reveal which accounts exist
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Service orchestrating login and logout
pub struct SessionService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    deny_list: Arc<dyn TokenDenyList + Send + Sync>,
    token_config: TokenConfig,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        deny_list: Arc<dyn TokenDenyList + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            deny_list,
            token_config,
        }
    }

    /// Checks credentials and confirmation state, then issues a token.
    /// All three failure modes share the 401 status.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(String, UserModel), AppError> {
        info!(email = %email, "Processing login");

        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| {
                warn!("Login with unknown email");
                AppError::Unauthorized(BAD_CREDENTIALS.to_string())
            })?;

        if !password::verify(password, &user.password_hash)? {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        // Confirmation gates token issuance: correct credentials alone are
        // not enough
        if !user.is_confirmed() {
            warn!(user_id = user.id, "Login before email confirmation");
            return Err(AppError::Unauthorized(
                "You have to confirm your email address before continuing".to_string(),
            ));
        }

        let (token, claims) = self.token_config.issue(user.id)?;
        info!(user_id = user.id, jti = %claims.jti, "Login successful");
        Ok((token, user))
    }

    /// Revokes the presented token's `jti` until the token would have
    /// expired anyway. Reaching this at all requires having passed the
    /// auth middleware.
    #[instrument(skip(self, claims))]
    pub async fn logout(&self, claims: &SessionClaims) -> Result<(), AppError> {
        info!(jti = %claims.jti, "Processing logout");

        let expired_at = DateTime::from_timestamp(claims.exp as i64, 0)
            .unwrap_or_else(Utc::now);
        self.deny_list.revoke(&claims.jti, expired_at).await?;

        info!(jti = %claims.jti, "Token revoked");
        Ok(())
    }
}
