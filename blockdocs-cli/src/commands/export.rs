//! Export command implementation

use super::spinner;
use anyhow::{Context, Result};
use blockdocs_core::store::LocalFileSystem;
use blockdocs_core::{DocumentEdit, DocumentStore, EditOptions, StoreConfig};
use std::path::Path;
use std::sync::Arc;

/// Export a saved container or a markup file as `.docx`
pub async fn export(input: &str, output: &str) -> Result<()> {
    let input_path = Path::new(input);
    let ext = input_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .context("Could not determine input file extension")?;

    let pb = spinner();
    pb.set_message("Reading input file...");
    let files = LocalFileSystem::new().with_open_path(input);
    let mut store = DocumentStore::builder(StoreConfig::from_env())
        .file_system(Arc::new(files))
        .build();

    let id = match ext.as_str() {
        "epub" => store
            .try_open()
            .await
            .with_context(|| format!("Failed to open {}", input))?
            .with_context(|| format!("Nothing opened from {}", input))?,
        "html" | "htm" | "xhtml" => {
            let markup = tokio::fs::read_to_string(input_path)
                .await
                .with_context(|| format!("Failed to open input file: {}", input))?;
            let id = store.new_document(None);
            store.edit(&id, DocumentEdit::new().content(markup), EditOptions::untracked())?;
            id
        }
        other => anyhow::bail!("Cannot export .{} files", other),
    };

    pb.set_message("Exporting...");
    let docx = store
        .export_docx(&id)
        .await
        .with_context(|| format!("Failed to export {}", input))?;
    tokio::fs::write(output, &docx)
        .await
        .with_context(|| format!("Failed to create output file: {}", output))?;

    tracing::info!("Exported {} ({} bytes)", input, docx.len());
    pb.finish_with_message(format!("Exported {} -> {}", input, output));
    Ok(())
}
