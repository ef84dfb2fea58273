use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{NewUser, UserModel},
    password,
    repository::UserRepository,
    types::{SignupParams, UpdateParams},
    validation::{self, ValidationErrors},
};
use crate::mailer::ConfirmationMailer;
use crate::shared::AppError;

const ALREADY_CONFIRMED: &str = "was already confirmed, please try signing in";

/// Service for signup, profile update, and the confirmation flows
pub struct RegistrationService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    mailer: Arc<dyn ConfirmationMailer + Send + Sync>,
    base_url: String,
}

impl RegistrationService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        mailer: Arc<dyn ConfirmationMailer + Send + Sync>,
    ) -> Self {
        // Public base for links embedded in outbound email
        let base_url = std::env::var("APP_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self {
            repository,
            mailer,
            base_url,
        }
    }

    /// Creates an unconfirmed account and emails the confirmation link
    #[instrument(skip(self, params))]
    pub async fn signup(&self, params: SignupParams) -> Result<UserModel, AppError> {
        info!(email = %params.email, "Processing signup");

        let mut errors = ValidationErrors::new();
        validation::validate_name(&params.name, &mut errors);
        validation::validate_email(&params.email, &mut errors);
        validation::validate_password(&params.password, &mut errors);

        if errors.is_empty()
            && self
                .repository
                .find_by_email(&params.email)
                .await?
                .is_some()
        {
            warn!(email = %params.email, "Signup with already registered email");
            errors.add("email", "has already been taken");
        }
        errors.into_result()?;

        let password_hash = password::hash(&params.password)?;
        let user = match self
            .repository
            .create_user(NewUser::new(params.name, params.email, password_hash))
            .await
        {
            Ok(user) => user,
            // Another signup can land between the lookup above and the
            // insert; the store's uniqueness check reports it the same way
            Err(AppError::EmailTaken) => {
                warn!("Signup lost an email uniqueness race");
                return Err(ValidationErrors::single("email", "has already been taken"));
            }
            Err(e) => return Err(e),
        };

        self.deliver_confirmation(&user).await?;

        info!(user_id = user.id, "User created, confirmation email sent");
        Ok(user)
    }

    /// Applies profile changes for the authenticated user.
    ///
    /// Field validations run first and fail the request with 422. The
    /// changes themselves are only applied when `current_password` matches
    /// the stored hash; otherwise the update is silently skipped and the
    /// request still succeeds. That skip-but-succeed asymmetry replicates
    /// the long-standing observed behavior of this API; see DESIGN.md
    /// before "fixing" it.
    #[instrument(skip(self, current_user, params))]
    pub async fn update(
        &self,
        current_user: &UserModel,
        params: UpdateParams,
    ) -> Result<UserModel, AppError> {
        info!(user_id = current_user.id, "Processing profile update");

        let mut errors = ValidationErrors::new();
        if let Some(name) = &params.name {
            validation::validate_name(name, &mut errors);
        }
        if let Some(new_password) = &params.password {
            validation::validate_password(new_password, &mut errors);
        }
        errors.into_result()?;

        let authorized = match &params.current_password {
            Some(current_password) => {
                password::verify(current_password, &current_user.password_hash)?
            }
            None => false,
        };
        if !authorized {
            warn!(
                user_id = current_user.id,
                "Missing or wrong current_password, skipping update"
            );
            return Ok(current_user.clone());
        }

        let mut user = current_user.clone();
        if let Some(name) = params.name {
            user.name = name;
        }
        if let Some(new_password) = params.password {
            user.password_hash = password::hash(&new_password)?;
        }
        self.repository.update_user(&user).await?;

        info!(user_id = user.id, "Profile updated");
        Ok(user)
    }

    /// Re-sends the confirmation link for an unconfirmed account
    #[instrument(skip(self))]
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), AppError> {
        info!(email = %email, "Processing confirmation resend");

        let mut user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| ValidationErrors::single("email", "not found"))?;

        if user.is_confirmed() {
            warn!(user_id = user.id, "Account already confirmed, not resending");
            return Err(ValidationErrors::single("email", ALREADY_CONFIRMED));
        }

        // Older unconfirmed rows may predate token issuance
        if user.confirmation_token.is_none() {
            user.confirmation_token = Some(uuid::Uuid::new_v4().to_string());
            self.repository.update_user(&user).await?;
        }

        self.deliver_confirmation(&user).await?;
        info!(user_id = user.id, "Confirmation email re-sent");
        Ok(())
    }

    /// Confirms the account behind an emailed link's token
    #[instrument(skip(self, token))]
    pub async fn confirm(&self, token: &str) -> Result<UserModel, AppError> {
        let mut user = self
            .repository
            .find_by_confirmation_token(token)
            .await?
            .ok_or_else(|| ValidationErrors::single("confirmation_token", "is invalid"))?;

        if user.is_confirmed() {
            return Err(ValidationErrors::single("email", ALREADY_CONFIRMED));
        }

        user.confirm();
        self.repository.update_user(&user).await?;

        info!(user_id = user.id, "Account confirmed");
        Ok(user)
    }

    async fn deliver_confirmation(&self, user: &UserModel) -> Result<(), AppError> {
        let token = user
            .confirmation_token
            .as_deref()
            .ok_or(AppError::Internal)?;
        let url = format!("{}/confirmation?confirmation_token={}", self.base_url, token);
        self.mailer.send_confirmation(&user.email, &url).await
    }
}
