//! Boundary with the editing surface
//!
//! The store never interprets the block tree beyond what persistence needs
//! (headings for navigation, `img` elements for assets). Everything else goes
//! through a [`ContentService`].

mod xhtml;

pub use xhtml::{
    escape_attr, escape_text, escape_xml, normalize_document, parse_body, parse_fragment,
    write_blocks,
};

use crate::types::Block;

/// Serialize/parse boundary of the editing surface
pub trait ContentService: Send + Sync {
    /// Serialize a block tree into markup
    fn serialize(&self, blocks: &[Block]) -> String;

    /// Parse markup into a block tree
    fn parse(&self, markup: &str) -> Vec<Block>;

    /// Block inserted when a document would otherwise be empty
    fn create_default_block(&self) -> Block;
}

/// HTML-backed content service
#[derive(Debug, Clone, Default)]
pub struct HtmlContentService;

impl HtmlContentService {
    pub fn new() -> Self {
        Self
    }
}

impl ContentService for HtmlContentService {
    fn serialize(&self, blocks: &[Block]) -> String {
        let mut out = String::new();
        write_blocks(blocks, &mut out);
        out
    }

    fn parse(&self, markup: &str) -> Vec<Block> {
        parse_fragment(markup)
    }

    fn create_default_block(&self) -> Block {
        Block::element("p")
    }
}
