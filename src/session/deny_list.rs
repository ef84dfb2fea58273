use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// Trait for the revocation ledger: the set of `jti` values whose tokens
/// were invalidated before their natural expiry.
///
/// Tokens are otherwise self-contained, so this set is the only shared
/// mutable state an authentication decision touches.
#[async_trait]
pub trait TokenDenyList {
    /// Idempotent insert; revoking the same `jti` twice is a no-op
    async fn revoke(&self, jti: &str, expired_at: DateTime<Utc>) -> Result<(), AppError>;
    /// Point lookup, read-your-writes within the process
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError>;
    /// Drops entries whose mirrored token expiry has passed. Maintenance
    /// only: an expired token is rejected by expiry regardless.
    async fn purge_expired(&self) -> Result<u64, AppError>;
}

/// In-memory implementation of TokenDenyList for development and testing
pub struct InMemoryTokenDenyList {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for InMemoryTokenDenyList {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTokenDenyList {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of deny-list entries
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenDenyList for InMemoryTokenDenyList {
    #[instrument(skip(self))]
    async fn revoke(&self, jti: &str, expired_at: DateTime<Utc>) -> Result<(), AppError> {
        debug!(jti = %jti, "Adding token to deny list in memory");

        let mut entries = self.entries.lock().unwrap();
        // Keep the first entry's expiry on repeat revocations
        entries.entry(jti.to_string()).or_insert(expired_at);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.contains_key(jti))
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self) -> Result<u64, AppError> {
        debug!("Purging expired deny-list entries from memory");

        let mut entries = self.entries.lock().unwrap();
        let now = Utc::now();
        let initial_count = entries.len();

        entries.retain(|_, expired_at| *expired_at >= now);

        let removed_count = initial_count - entries.len();
        debug!(
            expired_entries_removed = removed_count,
            "Expired deny-list entries purged from memory"
        );
        Ok(removed_count as u64)
    }
}

/// PostgreSQL implementation of the deny list, backed by the
/// `jwt_deny_list` table with an indexed `jti` column.
pub struct PostgresTokenDenyList {
    pool: PgPool,
}

impl PostgresTokenDenyList {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenDenyList for PostgresTokenDenyList {
    #[instrument(skip(self))]
    async fn revoke(&self, jti: &str, expired_at: DateTime<Utc>) -> Result<(), AppError> {
        debug!(jti = %jti, "Adding token to deny list in database");

        // ON CONFLICT keeps revocation idempotent under concurrent logouts
        sqlx::query(
            "INSERT INTO jwt_deny_list (jti, expired_at, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expired_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, jti = %jti, "Failed to insert deny-list entry");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM jwt_deny_list WHERE jti = $1) AS revoked",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, jti = %jti, "Failed to query deny list");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.get("revoked"))
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self) -> Result<u64, AppError> {
        debug!("Purging expired deny-list entries from database");

        let result = sqlx::query("DELETE FROM jwt_deny_list WHERE expired_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to purge expired deny-list entries");
                AppError::DatabaseError(e.to_string())
            })?;

        let rows_affected = result.rows_affected();
        debug!(
            expired_entries_removed = rows_affected,
            "Expired deny-list entries purged"
        );
        Ok(rows_affected)
    }
}
