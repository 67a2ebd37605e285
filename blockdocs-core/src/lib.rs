//! Blockdocs Core Library
//!
//! Persistence for a block-based authoring tool. Documents are saved as
//! EPUB-compatible containers: the block tree is serialized into an XHTML
//! shell, embedded images are extracted into archive assets, and a cover is
//! synthesized from a declarative configuration. The [`store::DocumentStore`]
//! owns open documents, their shared undo/redo history and the save and open
//! protocols.

pub mod assets;
pub mod config;
pub mod content;
pub mod cover;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod export;
pub mod store;
pub mod types;

pub use config::StoreConfig;
pub use error::{
    AssetError, BlockdocsError, ConversionError, FileError, ParseError, Result, StorageError,
};
pub use store::{DocumentEdit, DocumentStore, EditOptions, SaveOutcome};
pub use types::{
    AssetMap, Block, CoverConfig, Document, DocumentId, DocumentStatus, NavEntry,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new("Test Book");
        assert_eq!(doc.title, "Test Book");
        assert_eq!(doc.status, DocumentStatus::Clean);
        assert!(doc.blocks.is_empty());
    }
}
