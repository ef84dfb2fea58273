use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::UserModel;

/// Number of users per listing page
pub const PER_PAGE: i64 = 10;

/// Request body for POST /api/signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub user: SignupParams,
}

#[derive(Debug, Deserialize)]
pub struct SignupParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for PUT /api/signup. All fields optional; anything absent
/// is left untouched. `current_password` must match the stored hash for any
/// change to be applied.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub user: UpdateParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateParams {
    pub current_password: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Request body for POST /confirmation
#[derive(Debug, Deserialize)]
pub struct ConfirmationRequest {
    pub user: ConfirmationParams,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationParams {
    #[serde(default)]
    pub email: String,
}

/// Query string for GET /confirmation (the emailed link's target)
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirmation_token: String,
}

/// Full user representation, authenticated callers only
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserModel> for UserResponse {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Public listing entry. Deliberately has no email field so the public
/// index can never leak addresses.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ListedUser {
    pub id: i64,
    pub name: String,
}

impl From<&UserModel> for ListedUser {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Query string for GET /users
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

/// Response envelope for GET /users
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UsersPage {
    pub users: Vec<ListedUser>,
    #[serde(rename = "_pagination")]
    pub pagination: PaginationMeta,
    #[serde(rename = "_links")]
    pub links: PageLinks,
}

impl UsersPage {
    /// Builds the envelope for one page. `total_pages` is
    /// `ceil(total_count / per_page)`; the next-page link is present only
    /// while further pages exist.
    pub fn new(users: Vec<ListedUser>, page: i64, total_count: i64) -> Self {
        let total_pages = (total_count + PER_PAGE - 1) / PER_PAGE;
        let next_page =
            (page < total_pages).then(|| format!("/users?page={}", page + 1));

        Self {
            users,
            pagination: PaginationMeta {
                page,
                per_page: PER_PAGE,
                total_count,
                total_pages,
            },
            links: PageLinks {
                self_link: format!("/users?page={}", page),
                next_page,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_exposes_only_public_fields() {
        let user = UserModel {
            id: 7,
            name: "Blessed".to_string(),
            email: "blessed@example.com".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            confirmed_at: Some(Utc::now()),
            confirmation_token: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        let mut keys: Vec<&str> =
            json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["created_at", "email", "id", "name"]);
    }

    #[test]
    fn test_listed_user_has_no_email() {
        let user = ListedUser {
            id: 7,
            name: "Blessed".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 7, "name": "Blessed" }));
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_total_pages_is_exact_ceiling() {
        assert_eq!(UsersPage::new(vec![], 1, 0).pagination.total_pages, 0);
        assert_eq!(UsersPage::new(vec![], 1, 1).pagination.total_pages, 1);
        assert_eq!(UsersPage::new(vec![], 1, 10).pagination.total_pages, 1);
        assert_eq!(UsersPage::new(vec![], 1, 11).pagination.total_pages, 2);
        assert_eq!(UsersPage::new(vec![], 1, 30).pagination.total_pages, 3);
    }

    #[test]
    fn test_next_page_link_only_while_pages_remain() {
        let first = UsersPage::new(vec![], 1, 25);
        assert_eq!(first.links.next_page.as_deref(), Some("/users?page=2"));
        assert_eq!(first.links.self_link, "/users?page=1");

        let last = UsersPage::new(vec![], 3, 25);
        assert!(last.links.next_page.is_none());

        let json = serde_json::to_value(&last).unwrap();
        assert!(json["_links"].get("next_page").is_none());
    }
}
