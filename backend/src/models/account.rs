//! User accounts, sessions, and the request viewer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::UserId;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// "first last", trimmed. Empty when neither is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Full name when one is set, otherwise the username.
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.id,
            is_staff: self.is_staff,
        }
    }
}

pub(crate) fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let full = format!("{} {}", first_name, last_name);
    let full = full.trim();
    if full.is_empty() {
        username.to_string()
    } else {
        full.to_string()
    }
}

/// Data required to create a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
}

/// An authenticated session keyed by an opaque token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Identity of the user making a request, as seen by permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub is_staff: bool,
}

impl Viewer {
    /// Authors and staff may edit or delete a comment.
    pub fn can_edit(&self, author: UserId) -> bool {
        self.is_staff || self.user_id == author
    }
}
