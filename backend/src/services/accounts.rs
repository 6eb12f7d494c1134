//! Account registration, login and session tokens.
//!
//! Passwords are stored as `pbkdf2_sha256$<iterations>$<salt>$<hex digest>`
//! (PBKDF2-HMAC-SHA256, 32-byte output). Hashing runs on the blocking pool.
//!
//! Sessions older than the configured lifetime resolve to nobody and are
//! deleted on sight; every new login also prunes expired rows.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::api::{AuthResponse, UserPayload};
use crate::db::repository::AccountRepository;
use crate::models::{NewUser, Session, User};
use crate::routes::accounts::StatusResponse;

use super::error::{ServiceError, ServiceResult};

const HASH_ALGORITHM: &str = "pbkdf2_sha256";
const DIGEST_LEN: usize = 32;
pub const PASSWORD_ITERATIONS: u32 = 260_000;

/// Registration body. Both snake_case and camelCase field names are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, alias = "userName")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "userName")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    out
}

/// Hash a password with a fresh random salt.
///
/// CPU bound; async callers run it on the blocking pool.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}${}${}${}",
        HASH_ALGORITHM,
        PASSWORD_ITERATIONS,
        salt,
        hex::encode(derive(password, &salt, PASSWORD_ITERATIONS))
    )
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != HASH_ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let Ok(expected) = hex::decode(expected) else {
        return false;
    };
    if expected.len() != DIGEST_LEN {
        return false;
    }
    let derived = derive(password, salt, iterations);
    derived.as_slice().ct_eq(expected.as_slice()).into()
}

/// Run CPU-heavy work (password hashing) off the async workers.
async fn run_blocking<T, F>(work: F) -> ServiceResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Internal(format!("Password hashing task failed: {}", e)))
}

/// A new opaque session token.
pub fn new_session_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Create a user account.
///
/// # Errors
/// * `Validation` when username or password is missing, or the username is taken
pub async fn create_account<R>(
    repo: &R,
    request: &RegisterRequest,
    is_staff: bool,
) -> ServiceResult<User>
where
    R: AccountRepository + ?Sized,
{
    let username = request.username.as_deref().map(str::trim);
    let (Some(username), Some(password)) = (
        required(username),
        required(request.password.as_deref()),
    ) else {
        return Err(ServiceError::validation("Username and password are required"));
    };

    let password = password.to_string();
    let password_hash = run_blocking(move || hash_password(&password)).await?;

    let new_user = NewUser {
        username: username.to_string(),
        password_hash,
        first_name: request.first_name.clone().unwrap_or_default(),
        last_name: request.last_name.clone().unwrap_or_default(),
        email: request.email.clone().unwrap_or_default(),
        is_staff,
    };

    match repo.create_user(&new_user).await {
        Ok(user) => {
            log::info!("Registered user {} ({})", user.username, user.id);
            Ok(user)
        }
        Err(e) if e.is_conflict() => Err(ServiceError::validation("Username already registered")),
        Err(e) => Err(e.into()),
    }
}

/// Creation time before which a session is expired, or `None` when the
/// lifetime reaches past the start of the calendar.
fn expiry_cutoff(max_age: Duration) -> Option<chrono::DateTime<Utc>> {
    let max_age = chrono::Duration::from_std(max_age).ok()?;
    Utc::now().checked_sub_signed(max_age)
}

async fn start_session<R>(repo: &R, user: &User, max_age: Duration) -> ServiceResult<AuthResponse>
where
    R: AccountRepository + ?Sized,
{
    if let Some(cutoff) = expiry_cutoff(max_age) {
        let pruned = repo.delete_sessions_before(cutoff).await?;
        if pruned > 0 {
            log::debug!("Pruned {} expired sessions", pruned);
        }
    }

    let session = Session {
        token: new_session_token(),
        user_id: user.id,
        created_at: Utc::now(),
    };
    repo.create_session(&session).await?;
    Ok(AuthResponse {
        user: UserPayload::from(user),
        token: session.token,
    })
}

/// Register a regular user and log them in.
pub async fn register<R>(
    repo: &R,
    request: &RegisterRequest,
    session_ttl: Duration,
) -> ServiceResult<AuthResponse>
where
    R: AccountRepository + ?Sized,
{
    let user = create_account(repo, request, false).await?;
    start_session(repo, &user, session_ttl).await
}

/// Exchange credentials for a session.
///
/// # Errors
/// * `Validation` when a credential is missing
/// * `InvalidCredentials` when the user is unknown or the password is wrong
pub async fn login<R>(
    repo: &R,
    request: &LoginRequest,
    session_ttl: Duration,
) -> ServiceResult<AuthResponse>
where
    R: AccountRepository + ?Sized,
{
    let username = request.username.as_deref().map(str::trim);
    let (Some(username), Some(password)) = (
        required(username),
        required(request.password.as_deref()),
    ) else {
        return Err(ServiceError::validation("Incomplete credentials"));
    };

    let user = repo
        .find_user_by_username(username)
        .await?
        .ok_or(ServiceError::InvalidCredentials)?;

    let password = password.to_string();
    let stored = user.password_hash.clone();
    if !run_blocking(move || verify_password(&password, &stored)).await? {
        return Err(ServiceError::InvalidCredentials);
    }

    log::debug!("User {} logged in", user.id);
    start_session(repo, &user, session_ttl).await
}

/// End the session identified by `token`, if any.
pub async fn logout<R>(repo: &R, token: Option<&str>) -> ServiceResult<StatusResponse>
where
    R: AccountRepository + ?Sized,
{
    if let Some(token) = token {
        if repo.delete_session(token).await? {
            log::debug!("Session closed");
        }
    }
    Ok(StatusResponse::ok())
}

/// Resolve a session token to its user.
///
/// A session older than `max_age` is deleted and treated as anonymous.
pub async fn authenticate_token<R>(
    repo: &R,
    token: &str,
    max_age: Duration,
) -> ServiceResult<Option<User>>
where
    R: AccountRepository + ?Sized,
{
    if token.is_empty() {
        return Ok(None);
    }
    let Some((session, user)) = repo.find_session(token).await? else {
        return Ok(None);
    };
    if expiry_cutoff(max_age).is_some_and(|cutoff| session.created_at < cutoff) {
        repo.delete_session(token).await?;
        log::debug!("Session for user {} expired", user.id);
        return Ok(None);
    }
    Ok(Some(user))
}
