//! Application state for the HTTP server.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SessionSettings;

use crate::db::repository::FullRepository;
use crate::services::DealerDirectory;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Legacy dealer/review service client
    pub dealers: Arc<dyn DealerDirectory>,
    /// Set once this process has seen a non-empty catalogue.
    pub catalogue_checked: Arc<AtomicBool>,
    /// Sessions older than this are treated as signed out.
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>, dealers: Arc<dyn DealerDirectory>) -> Self {
        Self {
            repository,
            dealers,
            catalogue_checked: Arc::new(AtomicBool::new(false)),
            session_ttl: SessionSettings::default().ttl(),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}
