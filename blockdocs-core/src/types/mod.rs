//! Core types shared by the codecs and the document store

mod asset;
mod block;
mod cover;
mod document;
mod nav;

pub use asset::{content_address, AssetMap};
pub use block::{Block, VOID_ELEMENTS};
pub use cover::CoverConfig;
pub use document::{Document, DocumentId, DocumentStatus};
pub use nav::{anchor_for, assign_anchors, NavEntry};
