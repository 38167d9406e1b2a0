//! Clasificación por extensión y decodificadores de cada categoría.

mod audio;
mod image;
mod video;

use crate::error::ExtractError;
use crate::metadata::MetadataRecord;
use std::path::Path;

pub use audio::AudioExtractor;
pub use image::ImageExtractor;
pub use video::VideoExtractor;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "webp", "heic", "bmp", "gif"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "ogg", "wav", "aac", "wma"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wmv", "flv", "webm"];

/// Decodificador externo detrás de una interfaz uniforme.
pub trait MetadataExtractor {
    fn extract(&self, path: &Path) -> Result<MetadataRecord, ExtractError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MediaCategory {
    Image,
    Audio,
    Video,
    Unrecognized,
}

impl MediaCategory {
    pub fn from_extension(extension: &str) -> Self {
        let extension = extension.to_lowercase();
        let extension = extension.as_str();

        if IMAGE_EXTENSIONS.contains(&extension) {
            Self::Image
        } else if AUDIO_EXTENSIONS.contains(&extension) {
            Self::Audio
        } else if VIDEO_EXTENSIONS.contains(&extension) {
            Self::Video
        } else {
            Self::Unrecognized
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .map(|ext| Self::from_extension(&ext.to_string_lossy()))
            .unwrap_or(Self::Unrecognized)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Unrecognized => "unrecognized",
        }
    }

    pub fn extractor(self) -> Option<&'static dyn MetadataExtractor> {
        match self {
            Self::Image => Some(&ImageExtractor),
            Self::Audio => Some(&AudioExtractor),
            Self::Video => Some(&VideoExtractor),
            Self::Unrecognized => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_ignores_case() {
        assert_eq!(MediaCategory::from_extension("JPG"), MediaCategory::Image);
        assert_eq!(MediaCategory::from_extension("jpeg"), MediaCategory::Image);
        assert_eq!(MediaCategory::from_extension("Flac"), MediaCategory::Audio);
        assert_eq!(MediaCategory::from_extension("MKV"), MediaCategory::Video);
    }

    #[test]
    fn classification_is_stable_across_calls() {
        for _ in 0..3 {
            assert_eq!(
                MediaCategory::from_path(Path::new("clip.WebM")),
                MediaCategory::Video
            );
        }
    }

    #[test]
    fn unknown_or_missing_extensions_fall_through() {
        assert_eq!(
            MediaCategory::from_path(Path::new("notes.txt")),
            MediaCategory::Unrecognized
        );
        assert_eq!(
            MediaCategory::from_path(Path::new("Makefile")),
            MediaCategory::Unrecognized
        );
        assert!(MediaCategory::Unrecognized.extractor().is_none());
    }

    #[test]
    fn extension_sets_do_not_overlap() {
        for ext in IMAGE_EXTENSIONS {
            assert!(!AUDIO_EXTENSIONS.contains(ext));
            assert!(!VIDEO_EXTENSIONS.contains(ext));
        }
        for ext in AUDIO_EXTENSIONS {
            assert!(!VIDEO_EXTENSIONS.contains(ext));
        }
    }
}
