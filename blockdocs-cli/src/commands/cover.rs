//! Cover command implementation

use super::{load_cover_config, spinner};
use anyhow::{Context, Result};
use blockdocs_core::assets::HttpFetcher;
use blockdocs_core::cover::cover_image;
use blockdocs_core::StoreConfig;

/// Render a cover to a JPEG file
pub async fn cover(
    title: &str,
    author: Option<&str>,
    config: Option<&str>,
    output: &str,
) -> Result<()> {
    let cover = load_cover_config(config).await?;
    let fetcher = HttpFetcher::new(StoreConfig::from_env().http_timeout());

    let pb = spinner();
    pb.set_message("Rendering cover...");
    let jpeg = cover_image(&mut None, title, author, &cover, &fetcher)
        .await
        .context("Failed to render cover")?;
    tokio::fs::write(output, &jpeg)
        .await
        .with_context(|| format!("Failed to create output file: {}", output))?;

    pb.finish_with_message(format!("Cover written to {}", output));
    Ok(())
}
