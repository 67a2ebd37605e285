//! Encoder for the archive container

mod epub;

pub use epub::{
    media_type_for, render_content, render_descriptor, render_nav, EpubEncoder, Package,
    CONTAINER_FILE, CONTENT_FILE, COVER_CONFIG_FILE, COVER_IMAGE_FILE, EPUB_MIME_TYPE, NAV_FILE,
    PACKAGE_FILE,
};

/// Entries every container starts with, in order
pub const FIXED_LAYOUT: &[&str] = &[
    "mimetype",
    "META-INF/",
    CONTAINER_FILE,
    CONTENT_FILE,
    COVER_IMAGE_FILE,
    COVER_CONFIG_FILE,
    NAV_FILE,
    PACKAGE_FILE,
];
