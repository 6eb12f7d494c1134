//! Request bodies and small response types for the HTTP API.
//!
//! Bodies are parsed by hand from raw bytes: an empty body counts as `{}`
//! and anything that is not valid JSON for the target type is a 400.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AppError;
use crate::api::CommentId;

pub use crate::services::accounts::{LoginRequest, RegisterRequest};
pub use crate::services::catalogue::CatalogueQuery;

/// Parse a JSON request body leniently.
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        AppError::invalid_json()
    })
}

/// Body of comment create/edit requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub content: Option<String>,
    /// Number or numeric string; null, 0 and "" mean top-level.
    #[serde(default)]
    pub parent_id: Option<Value>,
}

impl CommentBody {
    pub fn parent_comment_id(&self) -> Result<Option<CommentId>, AppError> {
        let invalid = || AppError::BadRequest("parent_id must be an integer".to_string());
        let id = match &self.parent_id {
            None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(None),
            Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid)?,
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid())?,
            Some(_) => return Err(invalid()),
        };
        Ok((id != 0).then_some(CommentId::new(id)))
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}
