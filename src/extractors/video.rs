use crate::container;
use crate::error::ExtractError;
use crate::metadata::MetadataRecord;
use std::path::Path;

use super::MetadataExtractor;

const KEY_PREFIX: &str = "VIDEO_";

pub struct VideoExtractor;

impl MetadataExtractor for VideoExtractor {
    fn extract(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        let metadata = container::parse_container(path)?;
        Ok(record_from_plaintext(&metadata.export_plaintext()))
    }
}

/// Divide cada línea en el primer `:`; las líneas sin separador se descartan.
fn record_from_plaintext(lines: &[String]) -> MetadataRecord {
    let mut record = MetadataRecord::new();
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        record.insert(
            format!("{KEY_PREFIX}{}", key.trim()),
            value.trim().to_string(),
        );
    }
    record
}
