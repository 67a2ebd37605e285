//! Decoder for the archive container

mod epub;

pub use epub::{parse_descriptor, rootfile_path, DecodedPackage, EpubDecoder, PackageMetadata};
