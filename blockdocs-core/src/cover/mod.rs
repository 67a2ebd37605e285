//! Cover image synthesis (1400x2100 JPEG)

mod layout;
mod paint;
mod render;

pub use layout::{
    cap_lines, layout_cover, wrap_lines, MeasureText, PlacedLine, COVER_HEIGHT, COVER_WIDTH,
    MAX_TITLE_LINES,
};
pub use paint::{parse_linear_gradient, Background, Color, ColorStop};
pub use render::{encode_jpeg, paint_background, CoverRenderer, JPEG_QUALITY};

use crate::assets::AssetFetcher;
use crate::error::Result;
use crate::types::CoverConfig;

/// Bytes for `cover.jpg`: the custom image when one is set, otherwise a render
///
/// The renderer is created on first use; font discovery is slow.
pub async fn cover_image(
    renderer: &mut Option<CoverRenderer>,
    title: &str,
    author: Option<&str>,
    config: &CoverConfig,
    fetcher: &dyn AssetFetcher,
) -> Result<Vec<u8>> {
    match &config.custom_image {
        Some(jpeg) => Ok(jpeg.clone()),
        None => {
            renderer
                .get_or_insert_with(CoverRenderer::new)
                .render(title, author, config, fetcher)
                .await
        }
    }
}
