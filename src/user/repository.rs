use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewUser, UserModel};
use crate::shared::AppError;

/// Trait for user record storage
#[async_trait]
pub trait UserRepository {
    /// Inserts a new unconfirmed user, assigning `id` and `created_at`.
    /// Ids ascend with creation order.
    async fn create_user(&self, new_user: NewUser) -> Result<UserModel, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn find_by_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<UserModel>, AppError>;
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError>;
    /// Returns one page ordered by ascending creation time
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserModel>, AppError>;
    async fn count_users(&self) -> Result<i64, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is stored in memory and lost on restart. Id assignment mimics a
/// BIGSERIAL column: a counter incremented under the same lock as the map.
pub struct InMemoryUserRepository {
    inner: Mutex<InMemoryUsers>,
}

struct InMemoryUsers {
    users: HashMap<i64, UserModel>,
    next_id: i64,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InMemoryUsers {
                users: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, new_user))]
    async fn create_user(&self, new_user: NewUser) -> Result<UserModel, AppError> {
        debug!(email = %new_user.email, "Creating user in memory");

        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .values()
            .any(|u| u.email == new_user.email)
        {
            warn!(email = %new_user.email, "Email already taken");
            return Err(AppError::EmailTaken);
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let user = UserModel {
            id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            confirmed_at: None,
            confirmation_token: Some(new_user.confirmation_token),
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());

        debug!(user_id = id, "User created successfully in memory");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self, token))]
    async fn find_by_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<UserModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.confirmation_token.as_deref() == Some(token))
            .cloned())
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = user.id, "Updating user in memory");

        let mut inner = self.inner.lock().unwrap();
        if !inner.users.contains_key(&user.id) {
            warn!(user_id = user.id, "User not found for update in memory");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut users: Vec<UserModel> = inner.users.values().cloned().collect();
        // Ids ascend with creation time, so id order is creation order
        users.sort_by_key(|u| u.id);
        Ok(users
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    #[instrument(skip(self))]
    async fn count_users(&self) -> Result<i64, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.len() as i64)
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, new_user))]
    async fn create_user(&self, new_user: NewUser) -> Result<UserModel, AppError> {
        debug!(email = %new_user.email, "Creating user in database");

        let row = sqlx::query(
            "INSERT INTO users (name, email, password_hash, confirmation_token, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, password_hash, confirmed_at, confirmation_token, created_at",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.confirmation_token)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The unique index on email is the authoritative check; the
            // service's pre-insert lookup can lose a race to it
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                warn!("Email already taken");
                AppError::EmailTaken
            } else {
                warn!(error = %e, "Failed to create user in database");
                AppError::DatabaseError(e.to_string())
            }
        })?;

        Ok(row_to_user(&row))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, confirmed_at, confirmation_token, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = id, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, confirmed_at, confirmation_token, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    #[instrument(skip(self, token))]
    async fn find_by_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, confirmed_at, confirmation_token, created_at \
             FROM users WHERE confirmation_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by confirmation token");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = user.id, "Updating user in database");

        let result = sqlx::query(
            "UPDATE users SET name = $2, email = $3, password_hash = $4, \
             confirmed_at = $5, confirmation_token = $6 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.confirmed_at)
        .bind(&user.confirmation_token)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = user.id, "Failed to update user in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(user_id = user.id, "User not found for update");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserModel>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, email, password_hash, confirmed_at, confirmation_token, created_at \
             FROM users ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    #[instrument(skip(self))]
    async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to count users");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(row.get("count"))
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> UserModel {
    UserModel {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        confirmed_at: row.get("confirmed_at"),
        confirmation_token: row.get("confirmation_token"),
        created_at: row.get("created_at"),
    }
}
