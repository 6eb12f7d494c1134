//! Repository trait definitions for database operations.
//!
//! Storage is split across focused traits so each backend can be reasoned
//! about one concern at a time.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`catalogue`]: Makes, cars, listing queries and facets
//! - [`comment`]: Comment rows, including cascade deletion
//! - [`engagement`]: Favorite and comment-like membership rows
//! - [`account`]: Users and sessions
//!
//! # Convenience Trait Bound
//!
//! For code that needs every capability, use [`FullRepository`]:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let cars = repo.count_cars().await?;
//!     let favorites = repo.count_favorites(car_id).await?;
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod catalogue;
pub mod comment;
pub mod engagement;
pub mod error;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use account::AccountRepository;
pub use catalogue::CatalogueRepository;
pub use comment::CommentRepository;
pub use engagement::EngagementRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four
/// repository traits.
pub trait FullRepository:
    CatalogueRepository + CommentRepository + EngagementRepository + AccountRepository
{
}

impl<T> FullRepository for T where
    T: CatalogueRepository + CommentRepository + EngagementRepository + AccountRepository
{
}
