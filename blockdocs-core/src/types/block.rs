//! Block tree handed over by the editing surface
//!
//! The tree mirrors the markup it was parsed from: elements with sorted
//! attributes, text and comments. Comments carry the editor's block
//! delimiters (`<!-- wp:paragraph -->`) so they survive a save/open cycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Elements serialized as self-closing tags
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// A node in the block tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Element with attributes and nested children
    Element {
        name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<Block>,
    },

    /// Text run
    Text { text: String },

    /// Comment (block delimiters)
    Comment { text: String },
}

impl Block {
    /// Create an empty element
    pub fn element(name: impl Into<String>) -> Self {
        Block::Element {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Create a text node
    pub fn text(s: impl Into<String>) -> Self {
        Block::Text { text: s.into() }
    }

    /// Create a comment node
    pub fn comment(s: impl Into<String>) -> Self {
        Block::Comment { text: s.into() }
    }

    /// Create a paragraph holding plain text
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::element("p").with_child(Block::text(text))
    }

    /// Create a heading (level clamped to 1-6)
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::element(format!("h{}", level.clamp(1, 6))).with_child(Block::text(text))
    }

    /// Create an image element
    pub fn image(src: impl Into<String>) -> Self {
        Block::element("img").with_attr("src", src)
    }

    /// Set an attribute (no-op on text and comments)
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Append a child (no-op on text and comments)
    pub fn with_child(mut self, child: Block) -> Self {
        if let Block::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Element name, if this is an element
    pub fn name(&self) -> Option<&str> {
        match self {
            Block::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Attribute lookup
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Block::Element { attributes, .. } => attributes.get(key).map(|v| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Block::Element { attributes, .. } = self {
            attributes.insert(key.into(), value.into());
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        match self {
            Block::Element { attributes, .. } => attributes.remove(key),
            _ => None,
        }
    }

    /// Children of an element (empty for text and comments)
    pub fn children(&self) -> &[Block] {
        match self {
            Block::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            Block::Text { text } => text.clone(),
            Block::Comment { .. } => String::new(),
            Block::Element { children, .. } => {
                children.iter().map(|c| c.text_content()).collect()
            }
        }
    }

    /// Heading level for `h1`..`h6`
    pub fn heading_level(&self) -> Option<u8> {
        match self.name()? {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// Whether this is an `img` element carrying a `src`
    pub fn is_image(&self) -> bool {
        self.name() == Some("img") && self.attr("src").is_some()
    }

    /// Whether this element serializes as a self-closing tag
    pub fn is_void(&self) -> bool {
        self.name()
            .map(|n| VOID_ELEMENTS.contains(&n))
            .unwrap_or(false)
    }
}
