// Public API - what other modules can use
pub use handlers::{confirm, index, resend_confirmation, show, signup, update};

// Internal modules
mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod types;
pub mod validation;
