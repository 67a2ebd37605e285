//! CLI command implementations

mod cover;
mod export;
mod info;
mod pack;
mod validate;

pub use cover::cover;
pub use export::export;
pub use info::info;
pub use pack::pack;
pub use validate::validate;

use anyhow::{Context, Result};
use blockdocs_core::CoverConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a command works
fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Read a `cover.json`, or the default configuration
async fn load_cover_config(path: Option<&str>) -> Result<CoverConfig> {
    match path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read cover configuration: {}", path))?;
            CoverConfig::from_json(&json)
                .with_context(|| format!("Invalid cover configuration: {}", path))
        }
        None => Ok(CoverConfig::default()),
    }
}
