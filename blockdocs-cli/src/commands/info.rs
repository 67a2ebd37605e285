//! Info command implementation

use anyhow::{Context, Result};
use blockdocs_core::store::LocalFileSystem;
use blockdocs_core::types::assign_anchors;
use blockdocs_core::{CoverConfig, DocumentStore, NavEntry, StoreConfig};
use serde::Serialize;
use std::sync::Arc;

/// Document info output
#[derive(Serialize)]
struct DocumentInfo {
    id: String,
    title: String,
    author: Option<String>,
    language: Option<String>,
    headings: Vec<NavEntry>,
    assets: usize,
    cover: CoverConfig,
}

/// Display information about a saved document
pub async fn info(input: &str, json: bool) -> Result<()> {
    let files = LocalFileSystem::new().with_open_path(input);
    let mut store = DocumentStore::builder(StoreConfig::from_env())
        .file_system(Arc::new(files))
        .build();

    let id = store
        .try_open()
        .await
        .with_context(|| format!("Failed to open {}", input))?
        .with_context(|| format!("Nothing opened from {}", input))?;
    let doc = store
        .document(&id)
        .with_context(|| format!("Document {} missing after open", id))?;

    let mut blocks = doc.blocks.clone();
    let info = DocumentInfo {
        id: doc.id.to_string(),
        title: doc.title.clone(),
        author: doc.author.clone(),
        language: doc.language.clone(),
        headings: assign_anchors(&mut blocks),
        assets: store.ephemeral().len(),
        cover: doc.cover.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Id:          {}", info.id);
        println!("Title:       {}", info.title);
        if let Some(author) = &info.author {
            println!("Author:      {}", author);
        }
        if let Some(language) = &info.language {
            println!("Language:    {}", language);
        }
        println!("Assets:      {}", info.assets);
        println!("Background:  {}", info.cover.background);
        if info.cover.custom_image.is_some() {
            println!("Cover:       custom image");
        }
        if !info.headings.is_empty() {
            println!("Headings:");
            for entry in &info.headings {
                println!("  {} ({})", entry.title, entry.href);
            }
        }
    }

    Ok(())
}
