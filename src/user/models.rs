use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the users table.
///
/// Deliberately not serde-serializable: everything that leaves the API
/// goes through `UserResponse`/`ListedUser`, so `password_hash` and the
/// confirmation token cannot reach a response body.
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64, // Assigned by the store, ascending with creation order
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2id PHC string
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmation_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a new user. The store assigns `id` and
/// `created_at`; the account starts unconfirmed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub confirmation_token: String,
}

impl NewUser {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            name,
            email,
            password_hash,
            confirmation_token: Uuid::new_v4().to_string(),
        }
    }
}

impl UserModel {
    /// An unconfirmed user may never authenticate
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Marks the account confirmed and invalidates the confirmation token.
    /// `confirmed_at` is set exactly once; calling this on an already
    /// confirmed user is a no-op.
    pub fn confirm(&mut self) {
        if self.confirmed_at.is_none() {
            self.confirmed_at = Some(Utc::now());
        }
        self.confirmation_token = None;
    }
}
