//! Navigation entries derived from headings at save time

use super::Block;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A single entry of the navigation document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavEntry {
    /// Display title
    pub title: String,

    /// Fragment within `index.html` (`#anchor`, empty for the title entry)
    pub href: String,
}

impl NavEntry {
    /// Create a new nav entry
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
        }
    }
}

fn separator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static regex"))
}

/// Anchor for a heading: lower-cased, non-alphanumeric runs collapsed to `-`
pub fn anchor_for(heading: &str) -> String {
    separator_run()
        .replace_all(&heading.to_lowercase(), "-")
        .into_owned()
}

/// Assign an `id` to every heading (depth-first) and collect one entry per heading
pub fn assign_anchors(blocks: &mut [Block]) -> Vec<NavEntry> {
    let mut entries = Vec::new();
    collect_headings(blocks, &mut entries);
    entries
}

fn collect_headings(blocks: &mut [Block], entries: &mut Vec<NavEntry>) {
    for block in blocks {
        if block.heading_level().is_some() {
            let title = block.text_content().trim().to_string();
            let anchor = anchor_for(&title);
            block.set_attr("id", anchor.clone());
            entries.push(NavEntry::new(title, format!("#{}", anchor)));
        } else if let Some(children) = block.children_mut() {
            collect_headings(children, entries);
        }
    }
}
