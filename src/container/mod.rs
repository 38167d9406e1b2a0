//! Lectura de metadata de contenedores de video con volcado en texto plano.
//!
//! Cada lector recorre solo las cabeceras del contenedor (cajas ISO-BMFF,
//! elementos EBML, chunks RIFF, objetos ASF) y nunca decodifica el flujo.

mod asf;
mod avi;
mod flv;
mod mkv;
mod mp4;

use crate::error::ExtractError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContainerKind {
    Mp4,
    Matroska,
    Avi,
    Flv,
    Asf,
}

impl ContainerKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mp4 => "ISO base media (MP4/MOV)",
            Self::Matroska => "Matroska/WebM",
            Self::Avi => "AVI",
            Self::Flv => "Flash Video",
            Self::Asf => "Advanced Systems Format",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContainerMetadata {
    pub kind: ContainerKind,
    entries: Vec<(String, String)>,
}

impl ContainerMetadata {
    fn new(kind: ContainerKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Volcado línea a línea: una cabecera sin `:` y luego `clave: valor`.
    pub fn export_plaintext(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        lines.push(format!("Container metadata ({})", self.kind.label()));
        lines.extend(
            self.entries
                .iter()
                .map(|(key, value)| format!("{key}: {value}")),
        );
        lines
    }
}

pub fn parse_container(path: &Path) -> Result<ContainerMetadata, ExtractError> {
    let mut file = File::open(path)?;
    let mut header = [0_u8; 16];
    let read = read_up_to(&mut file, &mut header)?;
    let kind = detect_container(&header[..read])
        .ok_or_else(|| ExtractError::Container("unrecognized container signature".to_string()))?;
    drop(file);

    match kind {
        ContainerKind::Mp4 => mp4::read(path),
        ContainerKind::Matroska => mkv::read(path),
        ContainerKind::Avi => avi::read(path),
        ContainerKind::Flv => flv::read(path),
        ContainerKind::Asf => asf::read(path),
    }
}

pub fn detect_container(header: &[u8]) -> Option<ContainerKind> {
    if header.get(4..8) == Some(b"ftyp".as_slice())
        || header.get(4..8) == Some(b"moov".as_slice())
        || header.get(4..8) == Some(b"mdat".as_slice())
        || header.get(4..8) == Some(b"wide".as_slice())
    {
        return Some(ContainerKind::Mp4);
    }
    if header.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(ContainerKind::Matroska);
    }
    if header.starts_with(b"RIFF") && header.get(8..12) == Some(b"AVI ".as_slice()) {
        return Some(ContainerKind::Avi);
    }
    if header.starts_with(b"FLV") {
        return Some(ContainerKind::Flv);
    }
    if header.starts_with(&asf::HEADER_GUID) {
        return Some(ContainerKind::Asf);
    }
    None
}

/// Lee hasta llenar `buffer` o llegar al final del archivo.
fn read_up_to<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Lee como máximo `limit` bytes desde la posición actual.
fn read_prefix<R: Read>(reader: &mut R, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.take(limit).read_to_end(&mut data)?;
    Ok(data)
}

fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.2} s")
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn be_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes: [u8; 8] = data.get(at..at + 8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

fn le_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn le_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes: [u8; 8] = data.get(at..at + 8)?.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

fn fourcc(data: &[u8], at: usize) -> Option<String> {
    let bytes = data.get(at..at + 4)?;
    Some(String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_containers_by_signature() {
        assert_eq!(
            detect_container(b"\0\0\0\x18ftypisom\0\0\0\0"),
            Some(ContainerKind::Mp4)
        );
        assert_eq!(
            detect_container(&[0x1A, 0x45, 0xDF, 0xA3, 0x9F]),
            Some(ContainerKind::Matroska)
        );
        assert_eq!(
            detect_container(b"RIFF\x10\0\0\0AVI LIST"),
            Some(ContainerKind::Avi)
        );
        assert_eq!(
            detect_container(b"FLV\x01\x05\0\0\0\x09"),
            Some(ContainerKind::Flv)
        );
        assert_eq!(detect_container(&asf::HEADER_GUID), Some(ContainerKind::Asf));
        assert_eq!(detect_container(b"RIFF\x10\0\0\0WAVEfmt "), None);
        assert_eq!(detect_container(b""), None);
    }

    #[test]
    fn plaintext_starts_with_colonless_title() {
        let mut metadata = ContainerMetadata::new(ContainerKind::Flv);
        metadata.push("Version", "1");
        metadata.push("Creation date", "2024-01-15 10:30:00");

        let lines = metadata.export_plaintext();
        assert_eq!(lines.len(), 3);
        assert!(!lines[0].contains(':'));
        assert_eq!(lines[1], "Version: 1");
        assert_eq!(lines[2], "Creation date: 2024-01-15 10:30:00");
    }

    #[test]
    fn unknown_signature_is_an_error() {
        let dir = tempfile::Builder::new().prefix("container").tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"definitely not a video").unwrap();

        assert!(matches!(
            parse_container(&path),
            Err(ExtractError::Container(_))
        ));
    }
}
