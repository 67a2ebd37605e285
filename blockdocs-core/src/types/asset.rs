//! Extracted binary assets keyed by archive-relative filename

use std::collections::BTreeMap;

/// Archive-relative asset id to bytes
///
/// Backed by a sorted map so archives list assets in a stable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMap {
    assets: BTreeMap<String, Vec<u8>>,
}

impl AssetMap {
    /// Create an empty asset map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset under an explicit id, replacing any previous bytes
    pub fn insert(&mut self, id: impl Into<String>, data: Vec<u8>) {
        self.assets.insert(id.into(), data);
    }

    /// Insert bytes under their content-addressed id (`<sha256 prefix>.<ext>`)
    pub fn add(&mut self, data: Vec<u8>, extension: &str) -> String {
        let id = content_address(&data, extension);
        self.assets.insert(id.clone(), data);
        id
    }

    /// Get an asset by id
    pub fn get(&self, id: &str) -> Option<&[u8]> {
        self.assets.get(id).map(|d| d.as_slice())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }

    /// Move every asset of `other` into this map
    pub fn merge(&mut self, other: AssetMap) {
        self.assets.extend(other.assets);
    }

    /// Iterate over all assets in id order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.assets.iter()
    }

    /// Asset ids in order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(|k| k.as_str())
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl FromIterator<(String, Vec<u8>)> for AssetMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        Self {
            assets: iter.into_iter().collect(),
        }
    }
}

/// Content-addressed filename: first 16 hex chars of the SHA-256 plus extension
pub fn content_address(data: &[u8], extension: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hex::encode(hasher.finalize());
    format!("{}.{}", &digest[..16], extension.trim_start_matches('.'))
}
