//! User account and session repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::UserId;
use crate::models::{NewUser, Session, User};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a user.
    ///
    /// # Errors
    /// * `ConflictError` when the username is taken
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    async fn get_user(&self, user_id: UserId) -> RepositoryResult<Option<User>>;

    /// Store a session.
    ///
    /// # Errors
    /// * `NotFound` when the user does not exist
    /// * `ConflictError` when the token is already in use
    async fn create_session(&self, session: &Session) -> RepositoryResult<()>;

    /// Look up a session and its user. Expiry is left to the caller.
    async fn find_session(&self, token: &str) -> RepositoryResult<Option<(Session, User)>>;

    /// Remove a session. Returns whether it existed.
    async fn delete_session(&self, token: &str) -> RepositoryResult<bool>;

    /// Remove every session created before `cutoff`. Returns how many went.
    async fn delete_sessions_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<usize>;
}
