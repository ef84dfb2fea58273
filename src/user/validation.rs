//! Field validation producing per-field error maps.
//!
//! Error wording follows the API contract exactly; clients display these
//! messages as-is under their field name, e.g.
//! `{"errors": {"name": ["is too short (minimum is 3 characters)"]}}`.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::shared::AppError;

pub const NAME_MIN: usize = 3;
pub const NAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 6;

/// Ordered map from field name to the list of failed-constraint messages,
/// in the order the checks ran.
#[derive(Debug, Default, Serialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the accumulated errors: `Ok(())` if none, otherwise the
    /// 422 error carrying the map.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    /// Convenience constructor for a single-field failure
    pub fn single(field: &str, message: impl Into<String>) -> AppError {
        let mut errors = Self::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    #[cfg(test)]
    pub fn messages_for(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }
}

pub fn validate_name(name: &str, errors: &mut ValidationErrors) {
    if name.trim().is_empty() {
        errors.add("name", "can't be blank");
        return;
    }
    let length = name.chars().count();
    if length < NAME_MIN {
        errors.add(
            "name",
            format!("is too short (minimum is {} characters)", NAME_MIN),
        );
    } else if length > NAME_MAX {
        errors.add(
            "name",
            format!("is too long (maximum is {} characters)", NAME_MAX),
        );
    }
}

pub fn validate_email(email: &str, errors: &mut ValidationErrors) {
    if email.trim().is_empty() {
        errors.add("email", "can't be blank");
        return;
    }
    if !email_shape_ok(email) {
        errors.add("email", "is invalid");
    }
}

pub fn validate_password(password: &str, errors: &mut ValidationErrors) {
    if password.is_empty() {
        errors.add("password", "can't be blank");
        return;
    }
    if password.chars().count() < PASSWORD_MIN {
        errors.add(
            "password",
            format!("is too short (minimum is {} characters)", PASSWORD_MIN),
        );
    }
}

// Same shape check the original enforced: non-empty local and domain parts
// around a single '@', no whitespace anywhere.
fn email_shape_ok(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}
