//! Lectura de etiquetas EXIF con `kamadak-exif`.

use crate::error::ExtractError;
use crate::metadata::MetadataRecord;
use exif::{Context, Field, In, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::MetadataExtractor;

const KEY_PREFIX: &str = "IMG_";

/// Miniaturas embebidas y blobs del fabricante; no aportan texto útil.
const SKIPPED_TAGS: [Tag; 3] = [
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::MakerNote,
];

pub struct ImageExtractor;

impl MetadataExtractor for ImageExtractor {
    fn extract(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(&file);
        let exif = exif::Reader::new().read_from_container(&mut bufreader)?;

        let mut record = MetadataRecord::new();
        for field in exif.fields() {
            if SKIPPED_TAGS.contains(&field.tag) {
                continue;
            }
            record.insert(field_key(field), field.display_value().to_string());
        }

        Ok(record)
    }
}

fn field_key(field: &Field) -> String {
    format!("{KEY_PREFIX}{} {}", ifd_label(field), field.tag)
}

fn ifd_label(field: &Field) -> &'static str {
    if field.ifd_num == In::THUMBNAIL {
        return "Thumbnail";
    }

    match field.tag.context() {
        Context::Tiff => "Image",
        Context::Exif => "EXIF",
        Context::Gps => "GPS",
        Context::Interop => "Interoperability",
        _ => "Image",
    }
}
