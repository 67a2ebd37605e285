//! Pack command implementation

use super::{load_cover_config, spinner};
use anyhow::{bail, Context, Result};
use blockdocs_core::content::parse_body;
use blockdocs_core::store::LocalFileSystem;
use blockdocs_core::{DocumentEdit, DocumentStore, EditOptions, SaveOutcome, StoreConfig};
use std::path::Path;
use std::sync::Arc;

/// Import markup as a new document and save it as a container
pub async fn pack(
    input: &str,
    output: &str,
    title: Option<String>,
    author: Option<String>,
    cover: Option<&str>,
) -> Result<()> {
    let input_path = Path::new(input);

    let pb = spinner();
    pb.set_message("Reading input file...");
    let markup = tokio::fs::read_to_string(input_path)
        .await
        .with_context(|| format!("Failed to open input file: {}", input))?;
    let cover = load_cover_config(cover).await?;

    // Full documents and bare fragments both end up as the body's children
    let blocks = parse_body(&markup);
    let title = title.unwrap_or_else(|| {
        input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string()
    });

    let files = LocalFileSystem::new().with_save_path(output);
    let mut store = DocumentStore::builder(StoreConfig::from_env())
        .file_system(Arc::new(files))
        .build();
    let id = store.new_document(Some(&title));
    store.edit(
        &id,
        DocumentEdit::new().blocks(blocks).author(author).cover(cover),
        EditOptions::untracked(),
    )?;

    pb.set_message("Saving...");
    let outcome = store
        .try_save(&id)
        .await
        .with_context(|| format!("Failed to save {}", output))?;

    match outcome {
        SaveOutcome::Saved { name } | SaveOutcome::Downloaded { name } => {
            tracing::info!("Packed {} as {}", input, id);
            pb.finish_with_message(format!("Packed '{}' -> {}", title, name));
            Ok(())
        }
        SaveOutcome::Cancelled => bail!("No destination for {}", output),
    }
}
