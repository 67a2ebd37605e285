//! Raster cover synthesis with cosmic-text

use super::layout::{layout_cover, MeasureText, PlacedLine, COVER_HEIGHT, COVER_WIDTH, LINE_HEIGHT};
use super::paint::{Background, Color};
use crate::assets::AssetFetcher;
use crate::error::{ConversionError, Result};
use crate::types::CoverConfig;
use cosmic_text::{
    fontdb, Attrs, Buffer, Color as TextColor, Family, FontSystem, Metrics, Shaping, Style,
    SwashCache,
};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::collections::HashSet;

/// JPEG quality of synthesized covers (0.9)
pub const JPEG_QUALITY: u8 = 90;

/// Renders covers; holds the font database between renders
pub struct CoverRenderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl CoverRenderer {
    /// Create a renderer with system font discovery
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system,
            swash_cache: SwashCache::new(),
        }
    }

    /// Render the cover and encode it as JPEG
    ///
    /// When the config names a font it is fetched and loaded before any text is
    /// measured. A font that cannot be fetched fails the render; bytes that do
    /// not parse as a font fall back to the system sans-serif.
    pub async fn render(
        &mut self,
        title: &str,
        author: Option<&str>,
        config: &CoverConfig,
        fetcher: &dyn AssetFetcher,
    ) -> Result<Vec<u8>> {
        let family = match &config.font_url {
            Some(url) => self.load_font(fetcher.fetch(url).await?),
            None => None,
        };

        let image = self.render_image(title, author, config, family.as_deref());
        encode_jpeg(&image)
    }

    /// Register font bytes and return the family they provide
    pub fn load_font(&mut self, data: Vec<u8>) -> Option<String> {
        let db = self.font_system.db_mut();
        let before: HashSet<fontdb::ID> = db.faces().map(|face| face.id).collect();
        db.load_font_data(data);

        let family = db
            .faces()
            .find(|face| !before.contains(&face.id))
            .and_then(|face| face.families.first().map(|(name, _)| name.clone()));
        if family.is_none() {
            tracing::warn!("Cover font could not be parsed");
        }
        family
    }

    /// Draw the cover into an RGB surface
    pub fn render_image(
        &mut self,
        title: &str,
        author: Option<&str>,
        config: &CoverConfig,
        family: Option<&str>,
    ) -> RgbImage {
        let mut image = paint_background(&Background::parse(&config.background));
        let color = Color::parse(&config.color).unwrap_or(Color::BLACK);

        let lines = {
            let mut measure = TextMeasure {
                font_system: &mut self.font_system,
                family,
            };
            layout_cover(&mut measure, title, author, config)
        };

        for line in &lines {
            self.draw_line(&mut image, line, family, color);
        }
        image
    }

    fn draw_line(
        &mut self,
        image: &mut RgbImage,
        line: &PlacedLine,
        family: Option<&str>,
        color: Color,
    ) {
        let buffer = shaped_buffer(
            &mut self.font_system,
            &line.text,
            line.font_size,
            line.italic,
            family,
        );
        let line_y = buffer
            .layout_runs()
            .next()
            .map(|run| run.line_y)
            .unwrap_or(line.font_size);
        let origin_x = line.x.round() as i32;
        let origin_y = (line.baseline - line_y).round() as i32;

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            TextColor::rgba(color.r, color.g, color.b, color.a),
            |x, y, w, h, glyph| {
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        blend(image, origin_x + x + dx, origin_y + y + dy, glyph);
                    }
                }
            },
        );
    }
}

impl Default for CoverRenderer {
    fn default() -> Self {
        Self::new()
    }
}

struct TextMeasure<'a> {
    font_system: &'a mut FontSystem,
    family: Option<&'a str>,
}

impl MeasureText for TextMeasure<'_> {
    fn measure(&mut self, text: &str, font_size: f32, italic: bool) -> f32 {
        shaped_buffer(self.font_system, text, font_size, italic, self.family)
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
    }
}

/// Shape a single unwrapped line
fn shaped_buffer(
    font_system: &mut FontSystem,
    text: &str,
    font_size: f32,
    italic: bool,
    family: Option<&str>,
) -> Buffer {
    let attrs = Attrs::new()
        .family(family.map(Family::Name).unwrap_or(Family::SansSerif))
        .style(if italic { Style::Italic } else { Style::Normal });

    let mut buffer = Buffer::new(font_system, Metrics::new(font_size, font_size * LINE_HEIGHT));
    buffer.set_size(font_system, None, None);
    buffer.set_text(font_system, text, attrs, Shaping::Advanced);
    buffer.shape_until_scroll(font_system, false);
    buffer
}

fn blend(image: &mut RgbImage, x: i32, y: i32, src: TextColor) {
    if x < 0 || y < 0 || x >= image.width() as i32 || y >= image.height() as i32 {
        return;
    }
    let alpha = src.a() as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (channel, value) in pixel.0.iter_mut().zip([src.r(), src.g(), src.b()]) {
        *channel = (value as f32 * alpha + *channel as f32 * (1.0 - alpha)).round() as u8;
    }
}

/// Fill the canvas; gradients run from the top-left to the bottom-right corner
pub fn paint_background(background: &Background) -> RgbImage {
    let (width, height) = (COVER_WIDTH as f32, COVER_HEIGHT as f32);
    let diagonal = width * width + height * height;

    match background {
        Background::Solid(color) => {
            RgbImage::from_pixel(COVER_WIDTH, COVER_HEIGHT, Rgb(color.over_white()))
        }
        Background::Gradient(_) => RgbImage::from_fn(COVER_WIDTH, COVER_HEIGHT, |x, y| {
            let t = (x as f32 * width + y as f32 * height) / diagonal;
            Rgb(background.color_at(t).over_white())
        }),
    }
}

/// Encode an RGB surface as JPEG at quality 90
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| ConversionError::EncodingFailed(format!("cover JPEG: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryFetcher;
    use crate::error::{AssetError, BlockdocsError};

    fn near(pixel: &Rgb<u8>, expected: [u8; 3]) -> bool {
        pixel
            .0
            .iter()
            .zip(expected)
            .all(|(a, b)| (*a as i32 - b as i32).abs() <= 12)
    }

    #[test]
    fn test_gradient_runs_along_the_diagonal() {
        let image = paint_background(&Background::parse("linear-gradient(#000000, #ffffff)"));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(
            image.get_pixel(COVER_WIDTH - 1, COVER_HEIGHT - 1),
            &Rgb([255, 255, 255])
        );
        let middle = image.get_pixel(COVER_WIDTH / 2, COVER_HEIGHT / 2).0[0];
        assert!((120..=135).contains(&middle));
    }

    #[tokio::test]
    async fn test_render_produces_full_size_jpeg() {
        let mut renderer = CoverRenderer::new();
        let config = CoverConfig::default().with_background("#ff0000");

        let jpeg = renderer
            .render("", None, &config, &MemoryFetcher::new())
            .await
            .unwrap();

        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (COVER_WIDTH, COVER_HEIGHT));
        assert!(near(decoded.get_pixel(10, 10), [255, 0, 0]));
    }

    #[tokio::test]
    async fn test_missing_font_fails_the_render() {
        let mut renderer = CoverRenderer::new();
        let mut config = CoverConfig::default();
        config.font_url = Some("https://fonts.test/missing.ttf".to_string());

        let err = renderer
            .render("Title", Some("Author"), &config, &MemoryFetcher::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BlockdocsError::Asset(AssetError::FetchFailure { .. })));
    }

    #[tokio::test]
    async fn test_font_that_does_not_parse_falls_back() {
        let mut renderer = CoverRenderer::new();
        let mut config = CoverConfig::default();
        config.font_url = Some("https://fonts.test/broken.ttf".to_string());
        let fetcher = MemoryFetcher::new().with("https://fonts.test/broken.ttf", b"nope".to_vec());

        let jpeg = renderer
            .render("Title", None, &config, &fetcher)
            .await
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }

    #[tokio::test]
    async fn test_zero_font_size_renders() {
        let mut renderer = CoverRenderer::new();
        let config = CoverConfig::from_json(r#"{"fontSize": 0}"#).unwrap();

        let jpeg = renderer
            .render("Title", Some("Author"), &config, &MemoryFetcher::new())
            .await
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }

    #[test]
    fn test_unparseable_font_is_ignored() {
        let mut renderer = CoverRenderer::new();
        assert_eq!(renderer.load_font(b"not a font".to_vec()), None);
    }
}
