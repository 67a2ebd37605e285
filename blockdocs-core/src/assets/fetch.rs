//! Best-effort byte fetches for images and fonts

use super::ephemeral::{EphemeralStore, EPHEMERAL_SCHEME};
use crate::error::AssetError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::HashMap;
use std::time::Duration;

/// Fetch the bytes behind a URL
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// HTTP(S) fetcher
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a request timeout
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AssetError::UnsupportedReference(url.to_string()));
        }

        tracing::debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AssetError::fetch(url, e))?;
        let bytes = response.bytes().await.map_err(|e| AssetError::fetch(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// In-memory fetcher (for testing and offline use)
#[derive(Default)]
pub struct MemoryFetcher {
    data: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` for `url`
    pub fn with(mut self, url: impl Into<String>, data: Vec<u8>) -> Self {
        self.data.insert(url.into(), data);
        self
    }
}

#[async_trait]
impl AssetFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        self.data
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::fetch(url, "not found"))
    }
}

/// Resolves ephemeral and `data:` references locally, everything else remotely
pub struct AssetResolver<'a> {
    ephemeral: &'a EphemeralStore,
    remote: &'a dyn AssetFetcher,
}

impl<'a> AssetResolver<'a> {
    pub fn new(ephemeral: &'a EphemeralStore, remote: &'a dyn AssetFetcher) -> Self {
        Self { ephemeral, remote }
    }
}

#[async_trait]
impl AssetFetcher for AssetResolver<'_> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if url.starts_with(EPHEMERAL_SCHEME) {
            return self
                .ephemeral
                .resolve(url)
                .map(|data| data.as_ref().clone())
                .ok_or_else(|| AssetError::fetch(url, "ephemeral reference was released"));
        }
        if url.starts_with("data:") {
            return decode_data_uri(url).map(|(_, data)| data);
        }
        self.remote.fetch(url).await
    }
}

/// Decode a base64 `data:` URI into (media type, bytes)
pub fn decode_data_uri(url: &str) -> Result<(String, Vec<u8>), AssetError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::UnsupportedReference(url.to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::fetch(url, "malformed data URI"))?;
    let media_type = header.split(';').next().unwrap_or_default().to_string();

    if !header.ends_with(";base64") {
        return Err(AssetError::UnsupportedReference(
            "only base64 data URIs are supported".to_string(),
        ));
    }
    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| AssetError::fetch(url, e))?;
    Ok((media_type, data))
}

/// Extension for a non-ephemeral reference: media type, URL path, then content sniffing
pub fn extension_for(url: &str, data: &[u8]) -> String {
    if let Some(rest) = url.strip_prefix("data:") {
        let media_type = rest.split([';', ',']).next().unwrap_or_default();
        if let Some(ext) = media_type.strip_prefix("image/") {
            return normalize_extension(ext);
        }
    }

    let path = url.split(['?', '#']).next().unwrap_or_default();
    if let Some((_, ext)) = path.rsplit('/').next().unwrap_or_default().rsplit_once('.') {
        if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return normalize_extension(ext);
        }
    }

    image::guess_format(data)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .map(normalize_extension)
        .unwrap_or_else(|| "bin".to_string())
}

fn normalize_extension(ext: &str) -> String {
    match ext.to_ascii_lowercase().as_str() {
        "jpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        other => other.to_string(),
    }
}
