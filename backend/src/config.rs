//! Server and upstream service configuration.
//!
//! Values come from an optional `dealership.toml` and are then overridden by
//! environment variables:
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DEALER_BACKEND_URL`: Dealer/review service (default: http://localhost:3030)
//! - `SENTIMENT_ANALYZER_URL`: Sentiment service (default: http://localhost:5050/)
//! - `UPSTREAM_TIMEOUT_SEC`: Request timeout for both services (default: 10)
//! - `SESSION_TTL_SEC`: Session lifetime in seconds (default: 1209600, two weeks)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DEALER_BACKEND_URL: &str = "http://localhost:3030";
pub const DEFAULT_SENTIMENT_ANALYZER_URL: &str = "http://localhost:5050/";

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where the legacy dealer and sentiment services live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_dealer_url")]
    pub dealer_backend_url: String,
    #[serde(default = "default_sentiment_url")]
    pub sentiment_analyzer_url: String,
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            dealer_backend_url: default_dealer_url(),
            sentiment_analyzer_url: default_sentiment_url(),
            timeout_sec: default_timeout_sec(),
        }
    }
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }
}

/// Login session lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl_sec")]
    pub ttl_sec: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_sec: default_session_ttl_sec(),
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_sec)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_dealer_url() -> String {
    DEFAULT_DEALER_BACKEND_URL.to_string()
}

fn default_sentiment_url() -> String {
    DEFAULT_SENTIMENT_ANALYZER_URL.to_string()
}

fn default_timeout_sec() -> u64 {
    10
}

fn default_session_ttl_sec() -> u64 {
    14 * 24 * 60 * 60
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// `dealership.toml` from the working directory or `backend/` when
    /// present, defaults otherwise, then environment overrides.
    pub fn load() -> Result<Self> {
        let search_paths = [
            PathBuf::from("dealership.toml"),
            PathBuf::from("backend/dealership.toml"),
        ];
        let mut config = match search_paths.iter().find(|p| p.exists()) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
        }
        if let Ok(url) = std::env::var("DEALER_BACKEND_URL") {
            self.upstream.dealer_backend_url = url;
        }
        if let Ok(url) = std::env::var("SENTIMENT_ANALYZER_URL") {
            self.upstream.sentiment_analyzer_url = url;
        }
        if let Ok(timeout) = std::env::var("UPSTREAM_TIMEOUT_SEC") {
            self.upstream.timeout_sec = timeout.parse().with_context(|| {
                format!("UPSTREAM_TIMEOUT_SEC must be whole seconds, got '{}'", timeout)
            })?;
        }
        if let Ok(ttl) = std::env::var("SESSION_TTL_SEC") {
            self.session.ttl_sec = ttl.parse().with_context(|| {
                format!("SESSION_TTL_SEC must be whole seconds, got '{}'", ttl)
            })?;
        }
        self.validate()
    }

    /// Reject settings that would make the server unusable.
    pub fn validate(&self) -> Result<()> {
        if self.session.ttl_sec == 0 {
            anyhow::bail!("session lifetime must be at least one second");
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
