//! Session authentication for handlers.
//!
//! A request is authenticated by `Authorization: Bearer <token>` or by the
//! `sessionid` cookie. Unknown and expired tokens are treated as anonymous.

use std::time::Duration;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::error::AppError;
use super::state::AppState;
use crate::models::{User, Viewer};
use crate::services::accounts;

pub const SESSION_COOKIE: &str = "sessionid";

/// The caller's session, if any.
#[derive(Debug, Clone, Default)]
pub struct Auth {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Auth {
    /// The signed-in user, or 403.
    pub fn require(&self) -> Result<&User, AppError> {
        self.user.as_ref().ok_or_else(AppError::authentication_required)
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.user.as_ref().map(User::viewer)
    }
}

/// Extract the session token from the request headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age.as_secs()
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

impl FromRequestParts<AppState> for Auth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Auth::default());
        };
        let user =
            accounts::authenticate_token(state.repository.as_ref(), &token, state.session_ttl)
                .await?;
        Ok(Auth {
            token: Some(token),
            user,
        })
    }
}
