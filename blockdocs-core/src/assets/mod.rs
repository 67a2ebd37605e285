//! Conversion between ephemeral image references and archive assets

mod ephemeral;
mod extract;
mod fetch;

pub use ephemeral::{
    collect_refs, collect_refs_in_markup, EphemeralRef, EphemeralStore, EPHEMERAL_ID_ATTR,
    EPHEMERAL_SCHEME,
};
pub use extract::{asset_id_for, extract_assets, inline_assets, Extracted};
pub use fetch::{
    decode_data_uri, extension_for, AssetFetcher, AssetResolver, HttpFetcher, MemoryFetcher,
};
