//! Extraction (save) and inlining (open) of image assets
//!
//! Both directions walk the block tree depth-first, including nested children.

use super::ephemeral::{EphemeralRef, EphemeralStore, EPHEMERAL_ID_ATTR};
use super::fetch::{extension_for, AssetFetcher};
use crate::error::AssetError;
use crate::types::{content_address, AssetMap, Block};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};

/// Block tree with archive-relative image references plus the bytes they name
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub blocks: Vec<Block>,
    pub assets: AssetMap,
}

/// Resolve every image in `blocks` into an archive-relative asset
///
/// All fetches run concurrently; the first failure aborts the extraction and
/// nothing is returned.
pub async fn extract_assets(
    blocks: &[Block],
    fetcher: &dyn AssetFetcher,
) -> Result<Extracted, AssetError> {
    let mut sources = Vec::new();
    collect_sources(blocks, &mut HashSet::new(), &mut sources);
    tracing::debug!("Extracting {} image reference(s)", sources.len());

    let fetched = try_join_all(sources.iter().map(|src| async move {
        let data = fetcher.fetch(src).await?;
        Ok::<_, AssetError>((src.as_str(), data))
    }))
    .await?;

    let mut taken: HashMap<String, &[u8]> = HashMap::new();
    let mut resolved: HashMap<&str, (String, &[u8])> = HashMap::new();
    for (src, data) in &fetched {
        let mut id = asset_id_for(src, data);
        if taken.get(&id).is_some_and(|existing| *existing != data.as_slice()) {
            id = content_address(data, id.rsplit_once('.').map(|(_, e)| e).unwrap_or("bin"));
        }
        taken.insert(id.clone(), data.as_slice());
        resolved.insert(*src, (id, data.as_slice()));
    }

    let mut out = blocks.to_vec();
    let assets = rewrite_level(&mut out, &resolved);
    Ok(Extracted { blocks: out, assets })
}

/// Canonical archive id for the bytes behind `src`
pub fn asset_id_for(src: &str, data: &[u8]) -> String {
    match EphemeralRef::parse(src) {
        Some(reference) => match reference.archive_path() {
            Some(path) => path.to_string(),
            None => content_address(data, reference.extension()),
        },
        None => content_address(data, &extension_for(src, data)),
    }
}

fn collect_sources(blocks: &[Block], seen: &mut HashSet<String>, out: &mut Vec<String>) {
    for block in blocks {
        if block.is_image() {
            if let Some(src) = block.attr("src") {
                if seen.insert(src.to_string()) {
                    out.push(src.to_string());
                }
            }
        }
        collect_sources(block.children(), seen, out);
    }
}

/// Rewrite one level and return the assets it (and everything below it) uses
fn rewrite_level(blocks: &mut [Block], resolved: &HashMap<&str, (String, &[u8])>) -> AssetMap {
    let mut level = AssetMap::new();
    for block in blocks.iter_mut() {
        let hit = block
            .attr("src")
            .filter(|_| block.name() == Some("img"))
            .and_then(|src| resolved.get(src));
        if let Some((id, data)) = hit {
            let (id, data) = (id.clone(), data.to_vec());
            block.set_attr("src", id.clone());
            block.remove_attr(EPHEMERAL_ID_ATTR);
            level.insert(id, data);
        }

        if let Some(children) = block.children_mut() {
            level.merge(rewrite_level(children, resolved));
        }
    }
    level
}

/// Replace archive-relative image references with ephemeral ones
///
/// Each archive path is registered once per call; references that do not
/// resolve against `archive` are left untouched. Returns the number of
/// rewritten elements.
pub fn inline_assets(
    blocks: &mut [Block],
    archive: &AssetMap,
    ephemeral: &mut EphemeralStore,
) -> usize {
    let mut registered = HashMap::new();
    inline_level(blocks, archive, ephemeral, &mut registered)
}

fn inline_level(
    blocks: &mut [Block],
    archive: &AssetMap,
    ephemeral: &mut EphemeralStore,
    registered: &mut HashMap<String, String>,
) -> usize {
    let mut count = 0;
    for block in blocks.iter_mut() {
        let path = block
            .attr("src")
            .filter(|_| block.name() == Some("img"))
            .map(|src| src.trim_start_matches("./").to_string());

        if let Some(path) = path {
            if let Some(url) = registered.get(&path) {
                block.set_attr("src", url.clone());
                count += 1;
            } else if let Some(data) = archive.get(&path) {
                let url = ephemeral.register(data.to_vec(), &path).url();
                registered.insert(path, url.clone());
                block.set_attr("src", url);
                count += 1;
            }
        }

        if let Some(children) = block.children_mut() {
            count += inline_level(children, archive, ephemeral, registered);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetResolver, MemoryFetcher};

    fn nested(src: &str) -> Vec<Block> {
        vec![
            Block::paragraph("before"),
            Block::element("figure").with_child(
                Block::element("div")
                    .with_child(Block::image(src).with_attr(EPHEMERAL_ID_ATTR, "42")),
            ),
        ]
    }

    #[tokio::test]
    async fn test_extract_rewrites_nested_images() {
        let mut ephemeral = EphemeralStore::new();
        let reference = ephemeral.register(b"pixels".to_vec(), "png");
        let remote = MemoryFetcher::new();
        let resolver = AssetResolver::new(&ephemeral, &remote);

        let extracted = extract_assets(&nested(&reference.url()), &resolver).await.unwrap();

        let expected_id = content_address(b"pixels", "png");
        let img = &extracted.blocks[1].children()[0].children()[0];
        assert_eq!(img.attr("src"), Some(expected_id.as_str()));
        assert_eq!(img.attr(EPHEMERAL_ID_ATTR), None);
        assert_eq!(extracted.assets.get(&expected_id), Some(&b"pixels"[..]));
    }

    #[tokio::test]
    async fn test_archive_path_suffix_is_reused() {
        let mut ephemeral = EphemeralStore::new();
        let reference = ephemeral.register(b"jpeg".to_vec(), "3fa1c0de12345678.jpg");
        let remote = MemoryFetcher::new();
        let resolver = AssetResolver::new(&ephemeral, &remote);

        let extracted = extract_assets(&[Block::image(reference.url())], &resolver)
            .await
            .unwrap();
        assert_eq!(extracted.blocks[0].attr("src"), Some("3fa1c0de12345678.jpg"));
        assert_eq!(extracted.assets.len(), 1);
    }

    #[tokio::test]
    async fn test_identical_bytes_share_an_entry() {
        let remote = MemoryFetcher::new()
            .with("https://a.test/one.png", vec![1, 2, 3])
            .with("https://b.test/two.png", vec![1, 2, 3]);
        let blocks = vec![
            Block::image("https://a.test/one.png"),
            Block::image("https://b.test/two.png"),
        ];

        let extracted = extract_assets(&blocks, &remote).await.unwrap();
        assert_eq!(extracted.assets.len(), 1);
        assert_eq!(extracted.blocks[0].attr("src"), extracted.blocks[1].attr("src"));
    }

    #[tokio::test]
    async fn test_any_failed_fetch_aborts() {
        let remote = MemoryFetcher::new().with("https://a.test/ok.png", vec![1]);
        let blocks = vec![
            Block::image("https://a.test/ok.png"),
            Block::image("https://a.test/missing.png"),
        ];
        assert!(extract_assets(&blocks, &remote).await.is_err());
    }

    #[tokio::test]
    async fn test_inline_then_extract_is_identity_on_bytes() {
        let mut archive = AssetMap::new();
        let id = archive.add(b"figure".to_vec(), "gif");
        let mut blocks = vec![
            Block::element("figure").with_child(Block::image(id.clone())),
            Block::image(id.clone()),
            Block::image("unrelated.png"),
        ];

        let mut ephemeral = EphemeralStore::new();
        assert_eq!(inline_assets(&mut blocks, &archive, &mut ephemeral), 2);
        assert_eq!(ephemeral.len(), 1);
        assert_eq!(blocks[2].attr("src"), Some("unrelated.png"));

        let remote = MemoryFetcher::new().with("unrelated.png", vec![9]);
        let resolver = AssetResolver::new(&ephemeral, &remote);
        let extracted = extract_assets(&blocks, &resolver).await.unwrap();

        assert_eq!(extracted.blocks[0].children()[0].attr("src"), Some(id.as_str()));
        assert_eq!(extracted.blocks[1].attr("src"), Some(id.as_str()));
        assert_eq!(extracted.assets.get(&id), Some(&b"figure"[..]));
    }
}
