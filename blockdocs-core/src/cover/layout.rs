//! Title/author line breaking and placement on the cover canvas

use crate::types::CoverConfig;

pub const COVER_WIDTH: u32 = 1400;
pub const COVER_HEIGHT: u32 = 2100;

pub const MAX_TITLE_LINES: usize = 8;
pub const LINE_HEIGHT: f32 = 1.2;
/// Author size relative to the title size (100px against 160px)
pub const AUTHOR_SCALE: f32 = 0.625;
/// Gap between the title block and the author block
pub const AUTHOR_SPACING: f32 = 100.0;
pub const ELLIPSIS: char = '…';
/// Title sizes outside this range fall back to the default
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<f32> = 1.0..=COVER_HEIGHT as f32;

/// Width of a run of text at a given size
pub trait MeasureText {
    fn measure(&mut self, text: &str, font_size: f32, italic: bool) -> f32;
}

/// A line ready to draw, `baseline` in canvas pixels
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub font_size: f32,
    pub italic: bool,
}

/// Greedy word wrap on single spaces
///
/// A word wider than `max_width` is kept alone on its own line.
pub fn wrap_lines(
    measure: &mut dyn MeasureText,
    text: &str,
    font_size: f32,
    italic: bool,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split(' ') {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if !line.is_empty() && measure.measure(&candidate, font_size, italic) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}

/// Keep at most `max` lines, marking the last kept line with an ellipsis
pub fn cap_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() > max {
        lines.truncate(max);
        if let Some(last) = lines.last_mut() {
            last.push(ELLIPSIS);
        }
    }
    lines
}

/// Title font size, or the default when the configured one cannot be drawn
pub fn title_font_size(config: &CoverConfig) -> f32 {
    if FONT_SIZE_RANGE.contains(&config.font_size) {
        return config.font_size;
    }
    let fallback = CoverConfig::default().font_size;
    tracing::warn!(
        "Cover font size {} is out of range, using {}",
        config.font_size,
        fallback
    );
    fallback
}

/// Place title and author lines
///
/// The combined block is centered vertically, shifted by the configured
/// offset, and left-aligned at the left padding.
pub fn layout_cover(
    measure: &mut dyn MeasureText,
    title: &str,
    author: Option<&str>,
    config: &CoverConfig,
) -> Vec<PlacedLine> {
    let width = COVER_WIDTH as f32;
    let height = COVER_HEIGHT as f32;
    let max_width = (1.0 - (config.padding_left + config.padding_right) / 100.0) * width;
    let x = config.padding_left / 100.0 * width;

    let title_size = title_font_size(config);
    let author_size = title_size * AUTHOR_SCALE;
    let author = author.map(str::trim).filter(|a| !a.is_empty());

    let title_lines = cap_lines(
        wrap_lines(measure, title, title_size, false, max_width),
        MAX_TITLE_LINES,
    );
    let author_lines = author
        .map(|a| wrap_lines(measure, a, author_size, true, max_width))
        .unwrap_or_default();

    let total = title_lines.len() as f32 * title_size * LINE_HEIGHT
        + author_lines.len() as f32 * author_size * LINE_HEIGHT;
    let author_gap = if author.is_some() { AUTHOR_SPACING / 2.0 } else { 0.0 };
    let mut y = height / 2.0 - total / 2.0 - author_gap + config.vertical_offset / 100.0 * height;

    let mut placed = Vec::with_capacity(title_lines.len() + author_lines.len());
    let mut place = |lines: Vec<String>, font_size: f32, italic: bool, y: &mut f32| {
        let leading = font_size * LINE_HEIGHT - font_size;
        for text in lines {
            *y += font_size + leading / 2.0;
            placed.push(PlacedLine {
                text,
                x,
                baseline: *y,
                font_size,
                italic,
            });
            *y += leading / 2.0;
        }
    };

    place(title_lines, title_size, false, &mut y);
    if !author_lines.is_empty() {
        y += AUTHOR_SPACING;
        place(author_lines, author_size, true, &mut y);
    }
    placed
}
