use std::sync::Arc;

use accounts_api::session::deny_list::InMemoryTokenDenyList;
use accounts_api::session::token::TokenConfig;
use accounts_api::user::repository::InMemoryUserRepository;
use accounts_api::{router, AppState, RecordingMailer};
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use tower::ServiceExt; // for `oneshot`

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Full application wired with in-memory collaborators, driven through the
/// real router one request at a time.
pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
    pub user_repository: Arc<InMemoryUserRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        let user_repository = Arc::new(InMemoryUserRepository::new());
        let deny_list = Arc::new(InMemoryTokenDenyList::new());
        let mailer = Arc::new(RecordingMailer::new());

        let state = AppState::new(
            user_repository.clone(),
            deny_list,
            mailer.clone(),
            TokenConfig::new(),
        );

        Self {
            router: router(state),
            mailer,
            user_repository,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<axum::body::Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response<axum::body::Body> {
        self.json_request("POST", uri, body, token).await
    }

    pub async fn put_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response<axum::body::Body> {
        self.json_request("PUT", uri, body, token).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<axum::body::Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", token);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response<axum::body::Body> {
        let mut builder = Request::builder().method("DELETE").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", token);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    async fn json_request(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response<axum::body::Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", token);
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    // ------------------------------------------------------------------
    // Account-flow shortcuts
    // ------------------------------------------------------------------

    /// Signs up a user and asserts the API accepted it
    pub async fn signup(&self, name: &str, email: &str, password: &str) {
        let response = self
            .post_json(
                "/api/signup",
                serde_json::json!({
                    "user": { "name": name, "email": email, "password": password }
                }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "signup should succeed");
    }

    /// Follows the confirmation link that was emailed to the given address
    pub async fn confirm_from_email(&self, email: &str) {
        let sent = self.mailer.sent_to(email);
        let url = sent.last().expect("a confirmation email should have been sent");
        let (_, link) = url
            .split_once("/confirmation")
            .expect("confirmation link should point at /confirmation");

        let response = self.get(&format!("/confirmation{link}"), None).await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "confirmation link should work"
        );
    }

    /// Signs up and confirms in one go
    pub async fn register_confirmed(&self, name: &str, email: &str, password: &str) {
        self.signup(name, email, password).await;
        self.confirm_from_email(email).await;
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<axum::body::Body> {
        self.post_json(
            "/api/login",
            serde_json::json!({ "user": { "email": email, "password": password } }),
            None,
        )
        .await
    }

    /// Logs in and returns the Authorization header value (`Bearer ...`)
    pub async fn auth_token(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status(), StatusCode::OK, "login should succeed");
        response
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .expect("login response should carry an Authorization header")
            .to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<axum::body::Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
