// Public API - what other modules can use
pub use handlers::{login, logout};
pub use middleware::jwt_auth;
pub use types::{CurrentUser, SessionClaims};

// Internal modules
pub mod deny_list;
mod handlers;
mod middleware;
pub mod service;
pub mod token;
mod types;
