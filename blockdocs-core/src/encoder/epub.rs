//! EPUB container encoder
//!
//! Writes the fixed layout: `mimetype`, `META-INF/container.xml`,
//! `index.html`, `cover.jpg`, `cover.json`, `_nav.html`, `_package.xml`, then
//! one entry per asset.

use crate::content::{escape_xml, normalize_document};
use crate::error::ConversionError;
use crate::types::{AssetMap, CoverConfig, DocumentId, NavEntry};
use chrono::{DateTime, Utc};
use std::io::{Cursor, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const EPUB_MIME_TYPE: &str = "application/epub+zip";
pub const CONTAINER_FILE: &str = "META-INF/container.xml";
pub const CONTENT_FILE: &str = "index.html";
pub const COVER_IMAGE_FILE: &str = "cover.jpg";
pub const COVER_CONFIG_FILE: &str = "cover.json";
pub const NAV_FILE: &str = "_nav.html";
pub const PACKAGE_FILE: &str = "_package.xml";

const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
<rootfiles>
<rootfile full-path="_package.xml" media-type="application/oebps-package+xml"/>
</rootfiles>
</container>
"#;

/// Everything that goes into one archive
///
/// `body` is serialized content whose image references are already
/// archive-relative and whose headings already carry their anchors.
#[derive(Debug, Clone)]
pub struct Package<'a> {
    pub id: &'a DocumentId,
    pub title: &'a str,
    pub author: Option<&'a str>,
    pub language: &'a str,
    pub body: &'a str,
    pub nav: &'a [NavEntry],
    pub assets: &'a AssetMap,
    pub cover: &'a CoverConfig,
    pub cover_jpeg: &'a [u8],
}

/// Encoder for the EPUB 3 container
#[derive(Debug, Clone, Default)]
pub struct EpubEncoder {
    /// Fixed `dcterms:modified` (defaults to the current time)
    modified: Option<DateTime<Utc>>,
}

impl EpubEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the modification time written to the descriptor
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Assemble the archive in memory
    pub fn encode_to_vec(&self, package: &Package<'_>) -> Result<Vec<u8>, ConversionError> {
        let mut cursor = Cursor::new(Vec::new());
        self.encode(package, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the archive to a seekable writer
    pub fn encode<W: Write + Seek>(
        &self,
        package: &Package<'_>,
        writer: W,
    ) -> Result<(), ConversionError> {
        let mut zip = ZipWriter::new(writer);
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let cover_json = package
            .cover
            .to_json()
            .map_err(|e| ConversionError::EncodingFailed(format!("cover.json: {}", e)))?;
        let modified = self.modified.unwrap_or_else(Utc::now);

        write_entry(&mut zip, "mimetype", EPUB_MIME_TYPE.as_bytes(), stored)?;
        zip.add_directory("META-INF/", deflated).map_err(zip_error)?;
        write_entry(&mut zip, CONTAINER_FILE, CONTAINER_XML.as_bytes(), deflated)?;
        write_entry(
            &mut zip,
            CONTENT_FILE,
            render_content(package.title, package.language, package.body).as_bytes(),
            deflated,
        )?;
        write_entry(&mut zip, COVER_IMAGE_FILE, package.cover_jpeg, deflated)?;
        write_entry(&mut zip, COVER_CONFIG_FILE, cover_json.as_bytes(), deflated)?;
        write_entry(
            &mut zip,
            NAV_FILE,
            render_nav(package.title, package.language, package.nav).as_bytes(),
            deflated,
        )?;
        write_entry(
            &mut zip,
            PACKAGE_FILE,
            render_descriptor(package, modified).as_bytes(),
            deflated,
        )?;

        for (id, data) in package.assets.iter() {
            write_entry(&mut zip, id, data, deflated)?;
        }

        zip.finish().map_err(zip_error)?;
        tracing::debug!(
            "Encoded container for {} with {} asset(s)",
            package.id,
            package.assets.len()
        );
        Ok(())
    }
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
    options: FileOptions,
) -> Result<(), ConversionError> {
    zip.start_file(name, options).map_err(zip_error)?;
    zip.write_all(data)
        .map_err(|e| ConversionError::EncodingFailed(format!("{}: {}", name, e)))
}

fn zip_error(e: zip::result::ZipError) -> ConversionError {
    ConversionError::EncodingFailed(e.to_string())
}

const XHTML_DOCTYPE: &str = concat!(
    r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "#,
    r#""http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#
);

/// XHTML shell shared by the content and nav documents
fn xhtml_shell(title: &str, language: &str, body: &str) -> String {
    format!(
        r#"{}
<html xmlns="http://www.w3.org/1999/xhtml" lang="{}">
<head>
<!-- For XHTML compatibility. -->
<meta http-equiv="Content-Type" content="text/html; charset=UTF-8" />
<title>{}</title>
</head>
<body>
{}
</body>
</html>
"#,
        XHTML_DOCTYPE,
        escape_xml(language),
        escape_xml(title),
        body
    )
}

/// `index.html`: the shell around the content, re-serialized as XHTML
pub fn render_content(title: &str, language: &str, body: &str) -> String {
    normalize_document(&xhtml_shell(title, language, body))
}

/// `_nav.html`: the document title first, then one entry per heading
pub fn render_nav(title: &str, language: &str, nav: &[NavEntry]) -> String {
    let entries: Vec<String> = std::iter::once(&NavEntry::new(title, ""))
        .chain(nav.iter())
        .map(|entry| {
            format!(
                r#"<li><a href="{}{}">{}</a></li>"#,
                CONTENT_FILE,
                escape_xml(&entry.href),
                escape_xml(&entry.title)
            )
        })
        .collect();

    let body = format!(
        "<nav epub:type=\"toc\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n<ol>{}</ol>\n</nav>",
        entries.join("\n")
    );
    xhtml_shell("Navigation", language, &body)
}

/// `_package.xml`: OPF 3 descriptor
pub fn render_descriptor(package: &Package<'_>, modified: DateTime<Utc>) -> String {
    let title = if package.title.trim().is_empty() {
        "Untitled"
    } else {
        package.title
    };
    let creator = package
        .author
        .filter(|a| !a.trim().is_empty())
        .map(|a| format!("\n\t\t<dc:creator>{}</dc:creator>", escape_xml(a)))
        .unwrap_or_default();
    let assets: Vec<String> = package
        .assets
        .ids()
        .map(|id| {
            format!(
                r#"		<item id="a{}" href="{}" media-type="{}" />"#,
                manifest_id(id),
                escape_xml(id),
                media_type_for(id)
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="unique-id">
	<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
		<dc:title>{title}</dc:title>
		<dc:identifier id="unique-id">{id}</dc:identifier>
		<dc:language>{language}</dc:language>{creator}
		<meta property="dcterms:modified">{modified}</meta>
	</metadata>
	<manifest>
		<item id="cover" href="{cover}" media-type="image/jpeg" />
		<item id="nav" href="{nav}" media-type="application/xhtml+xml" properties="nav" />
		<item id="content" href="{content}" media-type="application/xhtml+xml" />
{assets}
	</manifest>
	<spine>
		<itemref idref="content" />
	</spine>
</package>
"#,
        title = escape_xml(title),
        id = escape_xml(package.id.as_str()),
        language = escape_xml(package.language),
        creator = creator,
        modified = modified.format("%Y-%m-%dT%H:%M:%SZ"),
        cover = COVER_IMAGE_FILE,
        nav = NAV_FILE,
        content = CONTENT_FILE,
        assets = assets.join("\n"),
    )
}

/// Media type inferred from the file extension
pub fn media_type_for(path: &str) -> String {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "svg" => "image/svg+xml".to_string(),
        "ttf" => "font/ttf".to_string(),
        "otf" => "font/otf".to_string(),
        "woff" => "font/woff".to_string(),
        "woff2" => "font/woff2".to_string(),
        "css" => "text/css".to_string(),
        "" | "bin" => "application/octet-stream".to_string(),
        other => format!("image/{}", other),
    }
}

/// XML-safe manifest id for an asset path
fn manifest_id(path: &str) -> String {
    path.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
