use crate::formatting::{format_seconds, format_size, format_timestamp};
use std::fs::{self, Metadata};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// `FILE_SIZE`, `CREATED`, `MODIFIED` y `FILE_EXTENSION`; vacío si `stat` falla.
pub fn filesystem_attributes(path: &Path) -> Vec<(String, String)> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "stat failed");
            return Vec::new();
        }
    };

    let mut attributes = vec![(String::from("FILE_SIZE"), format_size(metadata.len()))];
    if let Some(created) = created_seconds(&metadata) {
        attributes.push((String::from("CREATED"), created));
    }
    if let Ok(modified) = metadata.modified() {
        attributes.push((String::from("MODIFIED"), format_timestamp(modified)));
    }
    attributes.push((String::from("FILE_EXTENSION"), file_extension(path)));
    attributes
}

/// En Unix es el instante del último cambio de inodo (`st_ctime`).
#[cfg(unix)]
fn created_seconds(metadata: &Metadata) -> Option<String> {
    let seconds = metadata.ctime() as f64 + metadata.ctime_nsec() as f64 / 1_000_000_000.0;
    Some(format_seconds(seconds))
}

#[cfg(not(unix))]
fn created_seconds(metadata: &Metadata) -> Option<String> {
    metadata.created().ok().map(format_timestamp)
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
