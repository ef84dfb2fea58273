use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::types::SessionClaims;
use crate::shared::AppError;

/// Configuration for JWT token operations.
///
/// Issues self-contained bearer tokens and verifies signature and expiry.
/// Deliberately knows nothing about the deny list; revocation is checked by
/// the auth middleware so this stays pure.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub expiration_hours: i64,
}

impl TokenConfig {
    pub fn new() -> Self {
        // Short TTL by default: revocation only needs to hold until expiry
        let expiration_hours = std::env::var("SESSION_EXPIRATION_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(24);

        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            expiration_hours,
        }
    }

    #[cfg(test)]
    pub fn with_settings(secret: &str, expiration_hours: i64) -> Self {
        Self {
            secret: secret.to_string(),
            expiration_hours,
        }
    }

    /// Issues a signed token for the given user with a fresh `jti`
    #[instrument(skip(self))]
    pub fn issue(&self, user_id: i64) -> Result<(String, SessionClaims), AppError> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.expiration_hours)).timestamp() as usize;

        let claims = SessionClaims {
            sub: user_id,
            jti: Uuid::new_v4().to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        debug!(
            user_id,
            jti = %claims.jti,
            exp_timestamp = exp,
            "Issuing session token"
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode session token");
            AppError::Internal
        })?;

        Ok((token, claims))
    }

    /// Verifies signature and expiry, returning the claims if valid.
    /// Does not consult the deny list.
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        debug!("Decoding and verifying session token");

        // Expiry is exact: a token is invalid the moment `exp` passes, with
        // no grace window
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| {
            debug!(
                sub = data.claims.sub,
                jti = %data.claims.jti,
                exp = data.claims.exp,
                "Session token verified"
            );
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Session token verification failed");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_token() {
        let config = TokenConfig::with_settings("test-secret", 24);

        let (token, claims) = config.issue(42).unwrap();
        assert!(!token.is_empty());
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);

        let verified = config.verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_each_issuance_gets_fresh_jti() {
        let config = TokenConfig::with_settings("test-secret", 24);

        let (_, first) = config.issue(42).unwrap();
        let (_, second) = config.issue(42).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_malformed_token_is_unauthorized() {
        let config = TokenConfig::with_settings("test-secret", 24);
        let result = config.verify("invalid.token.here");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = TokenConfig::with_settings("secret-one", 24);
        let verifier = TokenConfig::with_settings("secret-two", 24);

        let (token, _) = issuer.issue(42).unwrap();
        assert!(issuer.verify(&token).is_ok());
        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    fn expired_token(secret: &str, seconds_past_expiry: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: 42,
            jti: Uuid::new_v4().to_string(),
            exp: (now - seconds_past_expiry) as usize,
            iat: (now - 7200) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = TokenConfig::with_settings("test-secret", 24);
        let token = expired_token("test-secret", 3600);

        let result = config.verify(&token);
        match result {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("expired")),
            other => panic!("expected expired-token rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_token_just_past_expiry_is_rejected() {
        let config = TokenConfig::with_settings("test-secret", 24);
        // 30s past exp: inside the window a default decode leeway would
        // still forgive
        let token = expired_token("test-secret", 30);

        let result = config.verify(&token);
        match result {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("expired")),
            other => panic!("expected expired-token rejection, got {other:?}"),
        }
    }
}
