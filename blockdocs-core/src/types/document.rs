//! The Document type - one editable unit held by the store

use super::{Block, CoverConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque document identity
///
/// Freshly created documents get a UUID; opened documents keep whatever the
/// package descriptor carried (`urn:uuid:...`, an ISBN, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the in-memory state differs from what was last persisted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Nothing to persist
    #[default]
    Clean,

    /// Edited since the last save or open
    Dirty,
}

/// A document held by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identity, also written as the package's unique identifier
    pub id: DocumentId,

    /// Document title
    pub title: String,

    /// Author shown on the cover and written as `dc:creator`
    pub author: Option<String>,

    /// `dc:language` read from an opened package; the store default otherwise
    #[serde(default)]
    pub language: Option<String>,

    /// Serialized content (markup)
    pub content: String,

    /// Block tree the content was serialized from
    pub blocks: Vec<Block>,

    /// How to render the cover
    pub cover: CoverConfig,

    /// Persistence status
    pub status: DocumentStatus,
}

impl Document {
    /// Create an empty document with a fresh identity and default cover
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: DocumentId::generate(),
            title: title.into(),
            author: None,
            language: None,
            content: String::new(),
            blocks: Vec::new(),
            cover: CoverConfig::default(),
            status: DocumentStatus::Clean,
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Whether there are edits that have not been persisted
    pub fn is_dirty(&self) -> bool {
        self.status == DocumentStatus::Dirty
    }

    /// File name suggested when asking for a save destination
    pub fn suggested_file_name(&self) -> String {
        let stem = self.title.trim();
        if stem.is_empty() {
            "document.epub".to_string()
        } else {
            format!("{}.epub", stem)
        }
    }
}
