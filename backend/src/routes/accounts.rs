use serde::{Deserialize, Serialize};

use crate::api::UserId;
use crate::models::User;

pub const REGISTER: &str = "/api/register/";
pub const LOGIN: &str = "/api/login/";
pub const LOGOUT: &str = "/api/logout/";

// Older front-end pages post to these.
pub const LEGACY_REGISTRATION: &str = "/djangoapp/registration";
pub const LEGACY_REGISTER: &str = "/djangoapp/register";
pub const LEGACY_LOGIN: &str = "/djangoapp/login";
pub const LEGACY_LOGOUT: &str = "/djangoapp/logout";

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub full_name: String,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            full_name: user.display_name(),
        }
    }
}

/// Register/login response: the user plus the session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserPayload,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
