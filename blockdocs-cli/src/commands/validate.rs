//! Validate command implementation

use anyhow::{bail, Context, Result};
use blockdocs_core::decoder::EpubDecoder;
use blockdocs_core::encoder::{EPUB_MIME_TYPE, FIXED_LAYOUT};
use std::io::{Cursor, Read};
use zip::{CompressionMethod, ZipArchive};

/// Validate a saved container
///
/// Every container must decode and carry the fixed entries. Strict mode also
/// checks their order and that `mimetype` comes first, uncompressed.
pub fn validate(input: &str, strict: bool) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to open input file: {}", input))?;

    let mut problems = Vec::new();
    let names = match entry_names(&bytes) {
        Ok(names) => names,
        Err(e) => {
            eprintln!("Invalid container: {}", e);
            bail!("Validation failed for {}", input);
        }
    };

    for required in FIXED_LAYOUT {
        if !names.iter().any(|n| n == required) {
            problems.push(format!("missing entry {}", required));
        }
    }

    if strict {
        if names.len() < FIXED_LAYOUT.len() || names[..FIXED_LAYOUT.len()] != *FIXED_LAYOUT {
            problems.push(format!("entries out of order: expected {}", FIXED_LAYOUT.join(", ")));
        }
        problems.extend(check_mimetype(&bytes)?);
    }

    let decoded = EpubDecoder::new().decode(&bytes);
    if let Err(e) = &decoded {
        problems.push(e.to_string());
    }

    match decoded {
        Ok(package) if problems.is_empty() => {
            println!("Valid container");
            println!("  Title: {}", package.metadata.title.as_deref().unwrap_or("(none)"));
            println!("  Id: {}", package.id);
            println!("  Assets: {}", package.assets.len());
            Ok(())
        }
        _ => {
            for problem in &problems {
                eprintln!("Invalid container: {}", problem);
            }
            bail!("Validation failed for {}", input);
        }
    }
}

fn entry_names(bytes: &[u8]) -> Result<Vec<String>> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    (0..zip.len())
        .map(|i| Ok(zip.by_index(i)?.name().to_string()))
        .collect()
}

fn check_mimetype(bytes: &[u8]) -> Result<Vec<String>> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let mut problems = Vec::new();
    let mut entry = match zip.by_name("mimetype") {
        Ok(entry) => entry,
        Err(_) => return Ok(problems),
    };

    if entry.compression() != CompressionMethod::Stored {
        problems.push("mimetype is compressed".to_string());
    }
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    if content != EPUB_MIME_TYPE {
        problems.push(format!("mimetype is {:?}", content));
    }
    Ok(problems)
}
