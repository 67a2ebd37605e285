//! EPUB container decoder

use crate::content::parse_body;
use crate::encoder::{
    COVER_CONFIG_FILE, COVER_IMAGE_FILE, CONTAINER_FILE, CONTENT_FILE, NAV_FILE, PACKAGE_FILE,
};
use crate::error::ParseError;
use crate::types::{AssetMap, Block, CoverConfig, DocumentId};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// Metadata read back from the package descriptor
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackageMetadata {
    /// `dc:identifier` (the one named by `unique-identifier` when present)
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub language: Option<String>,
}

/// A decoded container, before its images are inlined
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPackage {
    pub id: DocumentId,
    pub metadata: PackageMetadata,
    /// Children of `<body>`, with archive-relative image references
    pub blocks: Vec<Block>,
    pub cover: CoverConfig,
    /// Every entry outside the fixed layout
    pub assets: AssetMap,
}

/// Decoder for the EPUB container
#[derive(Debug, Clone, Default)]
pub struct EpubDecoder;

impl EpubDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode an archive held in memory
    pub fn decode(&self, data: &[u8]) -> Result<DecodedPackage, ParseError> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| ParseError::MalformedArchive(format!("not a zip archive ({})", e)))?;

        let content = read_entry(&mut archive, CONTENT_FILE)?
            .ok_or_else(|| ParseError::MalformedArchive(format!("{} is missing", CONTENT_FILE)))?;

        let descriptor_path = match read_entry(&mut archive, CONTAINER_FILE)? {
            Some(container) => rootfile_path(&String::from_utf8_lossy(&container))?
                .unwrap_or_else(|| PACKAGE_FILE.to_string()),
            None => PACKAGE_FILE.to_string(),
        };
        let descriptor = read_entry(&mut archive, &descriptor_path)?.ok_or_else(|| {
            ParseError::MissingMetadata(format!(
                "package descriptor {} is missing",
                descriptor_path
            ))
        })?;
        let metadata = parse_descriptor(&String::from_utf8_lossy(&descriptor))?;

        let cover = match read_entry(&mut archive, COVER_CONFIG_FILE)? {
            Some(json) => {
                let json = String::from_utf8_lossy(&json);
                CoverConfig::from_json(&json).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring unreadable {}: {}", COVER_CONFIG_FILE, e);
                    CoverConfig::default()
                })
            }
            None => CoverConfig::default(),
        };

        let mut assets = AssetMap::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| ParseError::MalformedArchive(e.to_string()))?;
            let name = file.name().to_string();
            if file.is_dir() || is_layout_entry(&name, &descriptor_path) {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| ParseError::MalformedArchive(format!("{}: {}", name, e)))?;
            assets.insert(name, data);
        }

        let id = match metadata.identifier.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() && id != "undefined" => DocumentId::from(id),
            _ => DocumentId::generate(),
        };

        let blocks = parse_body(&String::from_utf8_lossy(&content));
        tracing::debug!(
            "Decoded container {} ({} block(s), {} asset(s))",
            id,
            blocks.len(),
            assets.len()
        );

        Ok(DecodedPackage {
            id,
            metadata,
            blocks,
            cover,
            assets,
        })
    }
}

const FIXED_FILES: [&str; 5] = [
    CONTENT_FILE,
    COVER_IMAGE_FILE,
    COVER_CONFIG_FILE,
    NAV_FILE,
    PACKAGE_FILE,
];

fn is_layout_entry(name: &str, descriptor_path: &str) -> bool {
    name == "mimetype"
        || name.starts_with("META-INF/")
        || name == descriptor_path
        || FIXED_FILES.contains(&name)
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, ParseError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| ParseError::MalformedArchive(format!("{}: {}", name, e)))?;
            Ok(Some(data))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(ParseError::MalformedArchive(format!("{}: {}", name, e))),
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    match element
        .try_get_attribute(name)
        .map_err(|e| ParseError::InvalidXml(e.to_string()))?
    {
        Some(attr) => Ok(Some(
            attr.unescape_value()
                .map_err(|e| ParseError::InvalidXml(e.to_string()))?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

/// `full-path` of the first `rootfile` in `META-INF/container.xml`
pub fn rootfile_path(xml: &str) -> Result<Option<String>, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"rootfile" => {
                return attribute(&e, "full-path");
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(ParseError::InvalidXml(format!("container.xml: {}", e))),
            _ => {}
        }
    }
}

/// Read the Dublin Core fields of an OPF descriptor
pub fn parse_descriptor(xml: &str) -> Result<PackageMetadata, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut metadata = PackageMetadata::default();
    let mut unique_id_ref: Option<String> = None;
    let mut identifiers: Vec<(Option<String>, String)> = Vec::new();
    let mut current: Option<(Vec<u8>, Option<String>)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"package" => unique_id_ref = attribute(&e, "unique-identifier")?,
                    b"title" | b"identifier" | b"creator" | b"language" => {
                        current = Some((name, attribute(&e, "id")?));
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) if current.is_some() => {
                let value = t
                    .unescape()
                    .map_err(|e| ParseError::InvalidXml(format!("descriptor: {}", e)))?;
                text.push_str(&value);
            }
            Ok(Event::End(e)) => {
                let closes_current = current
                    .as_ref()
                    .is_some_and(|(field, _)| field.as_slice() == e.local_name().as_ref());
                let closed = if closes_current { current.take() } else { None };
                if let Some((field, id)) = closed {
                    let value = text.trim().to_string();
                    match field.as_slice() {
                        b"title" => {
                            metadata.title.get_or_insert(value);
                        }
                        b"creator" => {
                            metadata.creator.get_or_insert(value);
                        }
                        b"language" => {
                            metadata.language.get_or_insert(value);
                        }
                        _ => identifiers.push((id, value)),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::InvalidXml(format!("descriptor: {}", e))),
            _ => {}
        }
    }

    metadata.identifier = identifiers
        .iter()
        .find(|(id, _)| id.is_some() && *id == unique_id_ref)
        .or_else(|| identifiers.first())
        .map(|(_, value)| value.clone());
    Ok(metadata)
}
