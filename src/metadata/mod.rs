//! Despachador de metadata: decodificador por categoría más atributos del sistema de archivos.

mod filesystem;

use crate::extractors::MediaCategory;
use std::collections::BTreeMap;
use std::path::Path;

pub use filesystem::filesystem_attributes;

/// Claves ordenadas lexicográficamente; el reporte las recorre en este orden.
pub type MetadataRecord = BTreeMap<String, String>;

/// Nunca falla: los errores del decodificador se registran y dejan un registro parcial.
pub fn collect_metadata(path: &Path) -> MetadataRecord {
    let category = MediaCategory::from_path(path);

    let mut record = match category.extractor() {
        Some(extractor) => match extractor.extract(path) {
            Ok(record) => record,
            Err(error) => {
                tracing::debug!(
                    path = %path.display(),
                    category = category.label(),
                    %error,
                    "metadata extraction failed"
                );
                MetadataRecord::new()
            }
        },
        None => MetadataRecord::new(),
    };

    record.extend(filesystem_attributes(path));
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_gets_only_filesystem_keys() {
        let dir = tempfile::Builder::new().prefix("dispatch").tempdir().unwrap();
        let path = dir.path().join("blob.xyz");
        std::fs::write(&path, b"").unwrap();

        let record = collect_metadata(&path);
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["CREATED", "FILE_EXTENSION", "FILE_SIZE", "MODIFIED"]);
        assert_eq!(record["FILE_SIZE"], "0 bytes");
        assert_eq!(record["FILE_EXTENSION"], ".xyz");
    }

    #[test]
    fn decoder_failure_degrades_to_filesystem_keys() {
        let dir = tempfile::Builder::new().prefix("dispatch").tempdir().unwrap();
        let path = dir.path().join("broken.JPG");
        std::fs::write(&path, b"not an image").unwrap();

        let record = collect_metadata(&path);
        assert!(record.keys().all(|key| !key.starts_with("IMG_")));
        assert_eq!(record["FILE_EXTENSION"], ".jpg");
        assert_eq!(record["FILE_SIZE"], "12 bytes");
    }

    #[test]
    fn missing_file_yields_empty_record() {
        let dir = tempfile::Builder::new().prefix("dispatch").tempdir().unwrap();
        let record = collect_metadata(&dir.path().join("gone.mp4"));
        assert!(record.is_empty());
    }
}
