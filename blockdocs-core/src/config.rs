//! Store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for a [`crate::store::DocumentStore`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// `dc:language` written for documents that do not carry one
    pub language: String,

    /// Title given to new documents
    pub default_title: String,

    /// Directory of the local recovery cache
    pub recovery_dir: PathBuf,

    /// Timeout for remote image and font fetches
    pub http_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            default_title: "Untitled Document".to_string(),
            recovery_dir: PathBuf::from("./.blockdocs/recovery"),
            http_timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `BLOCKDOCS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let http_timeout_secs = match lookup("BLOCKDOCS_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid BLOCKDOCS_HTTP_TIMEOUT_SECS={:?}", raw);
                defaults.http_timeout_secs
            }),
            None => defaults.http_timeout_secs,
        };

        Self {
            language: lookup("BLOCKDOCS_LANGUAGE").unwrap_or(defaults.language),
            default_title: lookup("BLOCKDOCS_DEFAULT_TITLE").unwrap_or(defaults.default_title),
            recovery_dir: lookup("BLOCKDOCS_RECOVERY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.recovery_dir),
            http_timeout_secs,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
