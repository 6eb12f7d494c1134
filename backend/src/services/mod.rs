//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. They
//! are generic over the repository so the same code runs against the local
//! and Postgres backends, and against `&dyn FullRepository`.

pub mod accounts;
pub mod catalogue;
pub mod comment_tree;
pub mod comments;
pub mod dealers;
pub mod error;
pub mod profile;
pub mod seed;
pub mod toggle;

pub use comment_tree::build_comment_tree;
pub use dealers::{DealerDirectory, HttpDealerDirectory, UpstreamError};
pub use error::{ServiceError, ServiceResult};
pub use toggle::{toggle_comment_like, toggle_favorite};

use crate::db::repository::CatalogueRepository;

/// Check whether the storage backend is reachable.
pub async fn health_check<R>(repo: &R) -> ServiceResult<bool>
where
    R: CatalogueRepository + ?Sized,
{
    Ok(repo.health_check().await?)
}
