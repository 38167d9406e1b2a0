use super::{ContainerKind, ContainerMetadata, format_seconds, fourcc, le_u32, read_prefix};
use crate::error::ExtractError;
use std::fs::File;
use std::path::Path;

/// `hdrl` siempre precede a `movi`.
const HEADER_LIMIT: u64 = 1024 * 1024;

pub(super) fn read(path: &Path) -> Result<ContainerMetadata, ExtractError> {
    let mut file = File::open(path)?;
    let data = read_prefix(&mut file, HEADER_LIMIT)?;
    parse(&data)
}

fn parse(data: &[u8]) -> Result<ContainerMetadata, ExtractError> {
    if data.get(0..4) != Some(b"RIFF".as_slice()) || data.get(8..12) != Some(b"AVI ".as_slice()) {
        return Err(ExtractError::Container("missing RIFF AVI header".to_string()));
    }

    let mut metadata = ContainerMetadata::new(ContainerKind::Avi);
    let mut streams = Vec::new();

    for (id, body) in chunks(data.get(12..).unwrap_or_default()) {
        if id == "LIST" && body.get(0..4) == Some(b"hdrl".as_slice()) {
            parse_hdrl(&mut metadata, &mut streams, &body[4..]);
        }
    }

    for (index, (kind, handler)) in streams.into_iter().enumerate() {
        let number = index + 1;
        metadata.push(format!("Stream {number} type"), kind);
        if !handler.trim().is_empty() {
            metadata.push(format!("Stream {number} handler"), handler.trim().to_string());
        }
    }

    Ok(metadata)
}

fn parse_hdrl(
    metadata: &mut ContainerMetadata,
    streams: &mut Vec<(String, String)>,
    data: &[u8],
) {
    for (id, body) in chunks(data) {
        match id.as_str() {
            "avih" => parse_avih(metadata, body),
            "LIST" if body.get(0..4) == Some(b"strl".as_slice()) => {
                for (id, body) in chunks(&body[4..]) {
                    if id == "strh"
                        && let (Some(kind), Some(handler)) = (fourcc(body, 0), fourcc(body, 4))
                    {
                        streams.push((stream_type_label(&kind), handler));
                    }
                }
            }
            _ => {}
        }
    }
}

fn parse_avih(metadata: &mut ContainerMetadata, body: &[u8]) {
    let micros_per_frame = le_u32(body, 0).unwrap_or(0);
    let total_frames = le_u32(body, 16).unwrap_or(0);

    if micros_per_frame > 0 {
        let frame_rate = 1_000_000.0 / f64::from(micros_per_frame);
        metadata.push("Frame rate", format!("{frame_rate:.3}"));
        let seconds = f64::from(total_frames) * f64::from(micros_per_frame) / 1_000_000.0;
        metadata.push("Duration", format_seconds(seconds));
    }
    metadata.push("Frames", total_frames.to_string());
    if let Some(streams) = le_u32(body, 24) {
        metadata.push("Streams", streams.to_string());
    }
    if let Some(width) = le_u32(body, 32) {
        metadata.push("Width", format!("{width} pixels"));
    }
    if let Some(height) = le_u32(body, 36) {
        metadata.push("Height", format!("{height} pixels"));
    }
}

fn stream_type_label(fcc: &str) -> String {
    match fcc {
        "vids" => "video".to_string(),
        "auds" => "audio".to_string(),
        "txts" => "subtitles".to_string(),
        other => other.trim().to_string(),
    }
}

/// Chunks RIFF consecutivos; los tamaños impares se rellenan a par.
fn chunks(data: &[u8]) -> impl Iterator<Item = (String, &[u8])> {
    let mut offset = 0_usize;
    std::iter::from_fn(move || {
        let id = fourcc(data, offset)?;
        let size = le_u32(data, offset + 4)? as usize;
        let start = offset + 8;
        let end = start.checked_add(size)?.min(data.len());
        let body = data.get(start..end)?;
        offset = end + (size & 1);
        Some((id, body))
    })
}
