//! Word-processor export

mod docx;

pub use docx::{embeddable_png, fit_to_page, DocxExporter, PAGE_WIDTH_PX, PAGE_WIDTH_TWIPS};
