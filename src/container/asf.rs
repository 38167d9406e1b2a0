//! Objetos de cabecera ASF (`.wmv`, `.asf`).

use super::{ContainerKind, ContainerMetadata, format_seconds, le_u32, le_u64, read_prefix};
use crate::error::ExtractError;
use chrono::{Duration, NaiveDate};
use std::fs::File;
use std::path::Path;

pub(super) const HEADER_GUID: [u8; 16] = [
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const FILE_PROPERTIES_GUID: [u8; 16] = [
    0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const STREAM_PROPERTIES_GUID: [u8; 16] = [
    0x91, 0x07, 0xDC, 0xB7, 0xB7, 0xA9, 0xCF, 0x11, 0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const AUDIO_MEDIA_GUID: [u8; 16] = [
    0x40, 0x9E, 0x69, 0xF8, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B,
];
const VIDEO_MEDIA_GUID: [u8; 16] = [
    0xC0, 0xEF, 0x19, 0xBC, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B,
];

const HEADER_LIMIT: u64 = 1024 * 1024;
/// GUID + tamaño.
const OBJECT_HEADER_LEN: usize = 24;
/// Cabecera ASF: objeto + número de hijos (4) + dos bytes reservados.
const HEADER_OBJECT_LEN: usize = OBJECT_HEADER_LEN + 6;
const TICKS_PER_SECOND: f64 = 10_000_000.0;

pub(super) fn read(path: &Path) -> Result<ContainerMetadata, ExtractError> {
    let mut file = File::open(path)?;
    let data = read_prefix(&mut file, HEADER_LIMIT)?;
    parse(&data)
}

fn parse(data: &[u8]) -> Result<ContainerMetadata, ExtractError> {
    if !data.starts_with(&HEADER_GUID) {
        return Err(ExtractError::Container("missing ASF header object".to_string()));
    }
    let header_size = le_u64(data, 16)
        .and_then(|size| usize::try_from(size).ok())
        .unwrap_or(data.len())
        .min(data.len());
    let children = data.get(HEADER_OBJECT_LEN..header_size).unwrap_or_default();

    let mut metadata = ContainerMetadata::new(ContainerKind::Asf);
    let mut streams = 0;

    let mut offset = 0;
    while let Some(guid) = children.get(offset..offset + 16) {
        let Some(size) = le_u64(children, offset + 16).and_then(|s| usize::try_from(s).ok())
        else {
            break;
        };
        if size < OBJECT_HEADER_LEN {
            break;
        }
        let end = offset.saturating_add(size).min(children.len());
        let payload = children.get(offset + OBJECT_HEADER_LEN..end).unwrap_or_default();

        if guid == FILE_PROPERTIES_GUID {
            parse_file_properties(&mut metadata, payload);
        } else if guid == STREAM_PROPERTIES_GUID {
            streams += 1;
            parse_stream_properties(&mut metadata, streams, payload);
        }
        offset = end;
    }

    metadata.push("Streams", streams.to_string());
    Ok(metadata)
}

/// Carga útil: file id (16), tamaño, fecha, paquetes, duraciones, preroll.
fn parse_file_properties(metadata: &mut ContainerMetadata, payload: &[u8]) {
    if let Some(size) = le_u64(payload, 16) {
        metadata.push("File size", format!("{size} bytes"));
    }
    if let Some(date) = le_u64(payload, 24).and_then(format_filetime) {
        metadata.push("Creation date", date);
    }
    if let Some(packets) = le_u64(payload, 32) {
        metadata.push("Data packets", packets.to_string());
    }
    if let (Some(play), Some(preroll)) = (le_u64(payload, 40), le_u64(payload, 56)) {
        let seconds = play as f64 / TICKS_PER_SECOND - preroll as f64 / 1000.0;
        metadata.push("Duration", format_seconds(seconds.max(0.0)));
    }
    if let Some(bitrate) = le_u32(payload, 76) {
        metadata.push("Maximum bitrate", format!("{bitrate} bps"));
    }
}

fn parse_stream_properties(metadata: &mut ContainerMetadata, index: usize, payload: &[u8]) {
    let label = match payload.get(0..16) {
        Some(guid) if guid == AUDIO_MEDIA_GUID => "audio",
        Some(guid) if guid == VIDEO_MEDIA_GUID => "video",
        _ => "other",
    };
    metadata.push(format!("Stream {index} type"), label);
}

/// FILETIME: intervalos de 100 ns desde 1601-01-01.
fn format_filetime(ticks: u64) -> Option<String> {
    if ticks == 0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1601, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let seconds = i64::try_from(ticks / 10_000_000).ok()?;
    let datetime = epoch.checked_add_signed(Duration::try_seconds(seconds)?)?;
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
