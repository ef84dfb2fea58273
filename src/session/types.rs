use serde::{Deserialize, Serialize};

use crate::user::models::UserModel;

/// JWT claims carried by every session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub sub: i64,    // User id
    pub jti: String, // Unique per issuance, the revocation key
    pub exp: usize,  // Expiration timestamp (standard JWT claim)
    pub iat: usize,  // Issued at timestamp (standard JWT claim)
}

/// Request body for POST /api/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: LoginParams,
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request-scoped authenticated identity, inserted into request extensions
/// by the auth middleware and extracted by protected handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserModel);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_claims_serialization() {
        let claims = SessionClaims {
            sub: 42,
            jti: "jti-abc".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"sub\":42"));
        assert!(json.contains("jti-abc"));

        let deserialized: SessionClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }

    #[test]
    fn test_login_request_parses_nested_user() {
        let body = r#"{"user": {"email": "a@example.com", "password": "1234pass"}}"#;
        let request: LoginRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.user.email, "a@example.com");
        assert_eq!(request.user.password, "1234pass");
    }
}
