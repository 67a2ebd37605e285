//! DOCX export straight from serialized content
//!
//! Top-level elements map one to one onto Word constructs; anything the
//! mapping does not know is skipped.

use crate::assets::AssetFetcher;
use crate::content::parse_fragment;
use crate::error::{ConversionError, Result};
use crate::types::Block;
use docx_rs::{
    AbstractNumbering, BreakType, Docx, Header, Hyperlink, HyperlinkType, IndentLevel, Level,
    LevelJc, LevelText, LineSpacing, NumberFormat, Numbering, NumberingId, Paragraph, Pic, Run,
    Start, Style, StyleType, Table, TableCell, TableCellMargins, TableRow,
};
use image::ImageFormat;
use std::io::Cursor;

/// A4 width minus two 1-inch margins, in twips
pub const PAGE_WIDTH_TWIPS: usize = 11906 - 1440 * 2;
/// Page width in CSS pixels (15 twips per pixel)
pub const PAGE_WIDTH_PX: f32 = PAGE_WIDTH_TWIPS as f32 / 15.0;
const EMU_PER_PX: u32 = 9525;
const PARAGRAPH_SPACING: u32 = 200;
const CELL_PADDING: usize = 100;
const BULLET_NUMBERING: usize = 1;

#[derive(Debug, Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
}

/// Converts serialized content into a `.docx` package
pub struct DocxExporter<'a> {
    fetcher: &'a dyn AssetFetcher,
}

impl<'a> DocxExporter<'a> {
    pub fn new(fetcher: &'a dyn AssetFetcher) -> Self {
        Self { fetcher }
    }

    /// Export markup; any image that cannot be fetched or decoded aborts the export
    pub async fn export(&self, markup: &str) -> Result<Vec<u8>> {
        let mut elements: Vec<Block> = parse_fragment(markup)
            .into_iter()
            .filter(|b| b.name().is_some())
            .collect();
        let header = take_running_header(&mut elements);

        let mut docx = base_document();
        if let Some(text) = header {
            docx = docx.header(
                Header::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text))),
            );
        }

        for element in &elements {
            match element.name().unwrap_or_default() {
                "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    docx = docx.add_paragraph(text_paragraph(element));
                }
                "table" => docx = docx.add_table(table(element)),
                "ol" | "ul" => {
                    for item in descendants_named(element, &["li"]) {
                        let paragraph =
                            add_inlines(Paragraph::new(), item.children(), RunStyle::default())
                                .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0));
                        docx = docx.add_paragraph(paragraph);
                    }
                }
                "figure" => {
                    if let Some(src) = descendants_named(element, &["img"])
                        .into_iter()
                        .find_map(|img| img.attr("src"))
                    {
                        docx = docx.add_paragraph(self.figure(src).await?);
                    }
                }
                other => tracing::debug!("Skipping <{}> in DOCX export", other),
            }
        }

        let mut out = Vec::new();
        docx.build()
            .pack(Cursor::new(&mut out))
            .map_err(|e| ConversionError::EncodingFailed(format!("docx: {}", e)))?;
        tracing::debug!("Exported DOCX ({} bytes)", out.len());
        Ok(out)
    }

    async fn figure(&self, src: &str) -> Result<Paragraph> {
        let data = self.fetcher.fetch(src).await?;
        let (png, width, height) = embeddable_png(data)?;
        let (display_w, display_h) = fit_to_page(width, height);

        let pic = Pic::new_with_dimensions(png, width, height)
            .size(display_w * EMU_PER_PX, display_h * EMU_PER_PX);
        Ok(Paragraph::new()
            .line_spacing(spacing())
            .add_run(Run::new().add_image(pic)))
    }
}

/// Remove a bracketed first element and return its text
fn take_running_header(elements: &mut Vec<Block>) -> Option<String> {
    let text = elements.first()?.text_content();
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?.to_string();
    elements.remove(0);
    Some(inner)
}

fn base_document() -> Docx {
    let mut docx = Docx::new()
        .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(Level::new(
            0,
            Start::new(1),
            NumberFormat::new("bullet"),
            LevelText::new("•"),
            LevelJc::new("left"),
        )))
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
        .add_style(
            Style::new("Hyperlink", StyleType::Character)
                .name("Hyperlink")
                .color("0563C1")
                .underline("single"),
        );

    for (level, size) in (1..=6).zip([40, 32, 28, 26, 24, 22]) {
        docx = docx.add_style(
            Style::new(&format!("Heading{}", level), StyleType::Paragraph)
                .name(&format!("Heading {}", level))
                .size(size)
                .bold(),
        );
    }
    docx
}

fn spacing() -> LineSpacing {
    LineSpacing::new()
        .before(PARAGRAPH_SPACING)
        .after(PARAGRAPH_SPACING)
}

fn text_paragraph(element: &Block) -> Paragraph {
    let mut paragraph = Paragraph::new().line_spacing(spacing()).keep_lines(true);
    if let Some(level) = element.heading_level() {
        paragraph = paragraph
            .style(&format!("Heading{}", level))
            .keep_next(level == 1);
    }
    add_inlines(paragraph, element.children(), RunStyle::default())
}

fn table(element: &Block) -> Table {
    let rows: Vec<Vec<&Block>> = descendants_named(element, &["tr"])
        .into_iter()
        .map(|tr| descendants_named(tr, &["td", "th"]))
        .collect();
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let rows = rows
        .into_iter()
        .map(|cells| {
            let mut cells: Vec<TableCell> = cells
                .into_iter()
                .map(|cell| {
                    TableCell::new().add_paragraph(add_inlines(
                        Paragraph::new(),
                        cell.children(),
                        RunStyle::default(),
                    ))
                })
                .collect();
            while cells.len() < columns {
                cells.push(TableCell::new().add_paragraph(Paragraph::new()));
            }
            TableRow::new(cells)
        })
        .collect();

    Table::new(rows)
        .set_grid(vec![PAGE_WIDTH_TWIPS / columns; columns])
        .margins(TableCellMargins::new().margin(
            CELL_PADDING,
            CELL_PADDING,
            CELL_PADDING,
            CELL_PADDING,
        ))
}

/// Descendants with one of `names`, in document order, not descending into matches
fn descendants_named<'b>(block: &'b Block, names: &[&str]) -> Vec<&'b Block> {
    let mut found = Vec::new();
    for child in block.children() {
        if child.name().is_some_and(|n| names.contains(&n)) {
            found.push(child);
        } else {
            found.extend(descendants_named(child, names));
        }
    }
    found
}

fn add_inlines(mut paragraph: Paragraph, children: &[Block], style: RunStyle) -> Paragraph {
    for child in children {
        match child {
            Block::Text { text } => paragraph = paragraph.add_run(styled_run(text, style)),
            Block::Comment { .. } => {}
            Block::Element { name, .. } => match name.as_str() {
                "br" => {
                    paragraph = paragraph.add_run(Run::new().add_break(BreakType::TextWrapping))
                }
                "a" => {
                    let text = child.text_content();
                    let run = styled_run(&text, style).style("Hyperlink");
                    paragraph = match child.attr("href") {
                        Some(href) => paragraph.add_hyperlink(
                            Hyperlink::new(href, HyperlinkType::External).add_run(run),
                        ),
                        None => paragraph.add_run(run),
                    };
                }
                // nested lists become their own bullets
                "ol" | "ul" => {}
                "b" | "strong" => {
                    let bold = RunStyle { bold: true, ..style };
                    paragraph = add_inlines(paragraph, child.children(), bold)
                }
                "i" | "em" => {
                    let italic = RunStyle { italic: true, ..style };
                    paragraph = add_inlines(paragraph, child.children(), italic)
                }
                _ => paragraph = add_inlines(paragraph, child.children(), style),
            },
        }
    }
    paragraph
}

fn styled_run(text: &str, style: RunStyle) -> Run {
    let mut run = Run::new().add_text(text);
    if style.bold {
        run = run.bold();
    }
    if style.italic {
        run = run.italic();
    }
    run
}

/// Decode image bytes and return PNG bytes plus pixel dimensions
///
/// PNG input is kept as is; everything else (JPEG, GIF, WebP, ...) is
/// re-encoded, since the embedded media is written as PNG.
pub fn embeddable_png(data: Vec<u8>) -> Result<(Vec<u8>, u32, u32)> {
    let format = image::guess_format(&data)
        .map_err(|e| ConversionError::ImageDecode(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(&data, format)
        .map_err(|e| ConversionError::ImageDecode(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());

    if format == ImageFormat::Png {
        return Ok((data, width, height));
    }
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ConversionError::EncodingFailed(format!("PNG re-encode: {}", e)))?;
    Ok((png, width, height))
}

/// Scale down proportionally to the page width; never scale up
pub fn fit_to_page(width: u32, height: u32) -> (u32, u32) {
    if width as f32 <= PAGE_WIDTH_PX || width == 0 {
        return (width, height);
    }
    let scaled_h = height as f32 * PAGE_WIDTH_PX / width as f32;
    (PAGE_WIDTH_PX.round() as u32, scaled_h.round() as u32)
}
