//! Cajas ISO-BMFF: `ftyp`, `moov/mvhd` y los `trak` con su `tkhd`, `mdhd`, `hdlr` y `stsd`.

use super::{
    ContainerKind, ContainerMetadata, be_u16, be_u32, be_u64, format_seconds, fourcc, read_prefix,
};
use crate::error::ExtractError;
use chrono::{Duration, NaiveDate};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const FTYP_LIMIT: u64 = 64 * 1024;
const MOOV_LIMIT: u64 = 8 * 1024 * 1024;

struct BoxHeader {
    kind: [u8; 4],
    /// `None` cuando la caja se extiende hasta el final del archivo.
    payload_size: Option<u64>,
}

#[derive(Default)]
struct Track {
    handler: Option<String>,
    codec: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<f64>,
    channels: Option<u16>,
    sample_rate: Option<u32>,
}

pub(super) fn read(path: &Path) -> Result<ContainerMetadata, ExtractError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut metadata = ContainerMetadata::new(ContainerKind::Mp4);
    let mut mdat_seen = false;
    let mut moov_before_mdat = None;

    while let Some(header) = read_box_header(&mut reader)? {
        match &header.kind {
            b"ftyp" => {
                let limit = header.payload_size.unwrap_or(FTYP_LIMIT).min(FTYP_LIMIT);
                let payload = read_prefix(&mut reader, limit)?;
                skip_rest(&mut reader, &header, payload.len() as u64)?;
                push_brands(&mut metadata, &payload);
            }
            b"moov" => {
                moov_before_mdat = Some(!mdat_seen);
                let limit = header.payload_size.unwrap_or(MOOV_LIMIT).min(MOOV_LIMIT);
                let payload = read_prefix(&mut reader, limit)?;
                skip_rest(&mut reader, &header, payload.len() as u64)?;
                parse_moov(&mut metadata, &payload);
            }
            b"mdat" => {
                mdat_seen = true;
                skip_rest(&mut reader, &header, 0)?;
            }
            _ => skip_rest(&mut reader, &header, 0)?,
        }

        if header.payload_size.is_none() {
            break;
        }
    }

    if let Some(fast_start) = moov_before_mdat {
        metadata.push("Fast start", if fast_start { "yes" } else { "no" });
    }

    Ok(metadata)
}

fn read_box_header<R: Read>(reader: &mut R) -> Result<Option<BoxHeader>, ExtractError> {
    let mut buffer = [0_u8; 8];
    if super::read_up_to(reader, &mut buffer)? < buffer.len() {
        return Ok(None);
    }

    let size = u64::from(u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]));
    let mut kind = [0_u8; 4];
    kind.copy_from_slice(&buffer[4..8]);

    let payload_size = match size {
        0 => None,
        1 => {
            let mut large = [0_u8; 8];
            reader.read_exact(&mut large)?;
            Some(u64::from_be_bytes(large).saturating_sub(16))
        }
        _ => Some(size.saturating_sub(8)),
    };

    Ok(Some(BoxHeader { kind, payload_size }))
}

fn skip_rest<R: Seek>(
    reader: &mut R,
    header: &BoxHeader,
    consumed: u64,
) -> Result<(), ExtractError> {
    if let Some(size) = header.payload_size {
        let remaining = size.saturating_sub(consumed);
        if remaining > 0 {
            reader.seek(SeekFrom::Current(i64::try_from(remaining).unwrap_or(i64::MAX)))?;
        }
    }
    Ok(())
}

/// Itera las cajas hijas contenidas en `data`.
fn child_boxes(data: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut offset = 0_usize;
    std::iter::from_fn(move || {
        let size = be_u32(data, offset)? as usize;
        let kind: [u8; 4] = data.get(offset + 4..offset + 8)?.try_into().ok()?;
        let (start, end) = match size {
            0 => (offset + 8, data.len()),
            1 => {
                let large = usize::try_from(be_u64(data, offset + 8)?).ok()?;
                (offset + 16, offset.checked_add(large)?)
            }
            n if n < 8 => return None,
            n => (offset + 8, offset.checked_add(n)?),
        };
        let end = end.min(data.len());
        let payload = data.get(start..end)?;
        offset = end;
        Some((kind, payload))
    })
}

fn push_brands(metadata: &mut ContainerMetadata, payload: &[u8]) {
    let Some(major) = fourcc(payload, 0) else {
        return;
    };
    let format = if major.trim() == "qt" { "QuickTime" } else { "MPEG-4" };
    metadata.push("Format", format);
    metadata.push("Major brand", major);

    let compatible: Vec<String> = (8..payload.len())
        .step_by(4)
        .filter_map(|offset| fourcc(payload, offset))
        .filter(|brand| !brand.trim().is_empty())
        .collect();
    if !compatible.is_empty() {
        metadata.push("Compatible brands", compatible.join(", "));
    }
}

fn parse_moov(metadata: &mut ContainerMetadata, data: &[u8]) {
    let mut tracks = Vec::new();

    for (kind, payload) in child_boxes(data) {
        match &kind {
            b"mvhd" => parse_mvhd(metadata, payload),
            b"trak" => tracks.push(parse_trak(payload)),
            _ => {}
        }
    }

    metadata.push("Tracks", tracks.len().to_string());
    for (index, track) in tracks.iter().enumerate() {
        push_track(metadata, index + 1, track);
    }
}

fn parse_mvhd(metadata: &mut ContainerMetadata, payload: &[u8]) {
    let Some((created, modified, timescale, duration)) = mvhd_fields(payload) else {
        return;
    };

    if let Some(date) = format_mp4_time(created) {
        metadata.push("Creation date", date);
    }
    if let Some(date) = format_mp4_time(modified) {
        metadata.push("Last modification", date);
    }
    if timescale > 0 {
        metadata.push("Duration", format_seconds(duration as f64 / f64::from(timescale)));
        metadata.push("Timescale", timescale.to_string());
    }
}

/// (creación, modificación, escala de tiempo, duración) según la versión de la caja.
fn mvhd_fields(payload: &[u8]) -> Option<(u64, u64, u32, u64)> {
    match payload.first()? {
        1 => Some((
            be_u64(payload, 4)?,
            be_u64(payload, 12)?,
            be_u32(payload, 20)?,
            be_u64(payload, 24)?,
        )),
        0 => Some((
            u64::from(be_u32(payload, 4)?),
            u64::from(be_u32(payload, 8)?),
            be_u32(payload, 12)?,
            u64::from(be_u32(payload, 16)?),
        )),
        _ => None,
    }
}

fn parse_trak(data: &[u8]) -> Track {
    let mut track = Track::default();

    for (kind, payload) in child_boxes(data) {
        match &kind {
            b"tkhd" => {
                let offset = if payload.first() == Some(&1) { 88 } else { 76 };
                let width = be_u32(payload, offset).map(|value| value >> 16);
                let height = be_u32(payload, offset + 4).map(|value| value >> 16);
                if let (Some(width), Some(height)) = (width, height)
                    && width > 0
                    && height > 0
                {
                    track.width = Some(width);
                    track.height = Some(height);
                }
            }
            b"mdia" => parse_mdia(&mut track, payload),
            _ => {}
        }
    }

    track
}

fn parse_mdia(track: &mut Track, data: &[u8]) {
    for (kind, payload) in child_boxes(data) {
        match &kind {
            b"hdlr" => track.handler = fourcc(payload, 8),
            b"mdhd" => {
                let (timescale, duration) = if payload.first() == Some(&1) {
                    (be_u32(payload, 20), be_u64(payload, 24))
                } else {
                    (be_u32(payload, 12), be_u32(payload, 16).map(u64::from))
                };
                if let (Some(timescale), Some(duration)) = (timescale, duration)
                    && timescale > 0
                {
                    track.duration = Some(duration as f64 / f64::from(timescale));
                }
            }
            b"minf" => {
                if let Some(stbl) = find_child(payload, b"stbl")
                    && let Some(stsd) = find_child(stbl, b"stsd")
                {
                    parse_stsd(track, stsd);
                }
            }
            _ => {}
        }
    }
}

fn find_child<'a>(data: &'a [u8], wanted: &[u8; 4]) -> Option<&'a [u8]> {
    child_boxes(data)
        .find(|(kind, _)| kind == wanted)
        .map(|(_, payload)| payload)
}

/// Primera entrada de `stsd`: versión y flags (4), número de entradas (4), caja de muestra.
fn parse_stsd(track: &mut Track, payload: &[u8]) {
    track.codec = fourcc(payload, 12);

    if track.handler.as_deref() == Some("soun") {
        track.channels = be_u16(payload, 32);
        track.sample_rate = be_u32(payload, 40).map(|value| value >> 16);
    }
}

fn push_track(metadata: &mut ContainerMetadata, number: usize, track: &Track) {
    let prefix = format!("Track {number}");
    if let Some(handler) = &track.handler {
        metadata.push(format!("{prefix} type"), handler_label(handler));
    }
    if let Some(codec) = &track.codec {
        metadata.push(format!("{prefix} codec"), codec.clone());
    }
    if let Some(duration) = track.duration {
        metadata.push(format!("{prefix} duration"), format_seconds(duration));
    }
    if let (Some(width), Some(height)) = (track.width, track.height) {
        metadata.push(format!("{prefix} width"), format!("{width} pixels"));
        metadata.push(format!("{prefix} height"), format!("{height} pixels"));
    }
    if let Some(channels) = track.channels {
        metadata.push(format!("{prefix} channels"), channels.to_string());
    }
    if let Some(rate) = track.sample_rate {
        metadata.push(format!("{prefix} sample rate"), format!("{rate} Hz"));
    }
}

fn handler_label(handler: &str) -> String {
    match handler {
        "vide" => "video".to_string(),
        "soun" => "audio".to_string(),
        "text" | "sbtl" | "subt" => "subtitles".to_string(),
        "hint" => "hint".to_string(),
        other => other.to_string(),
    }
}

/// Los tiempos de `mvhd` cuentan segundos desde 1904-01-01; cero significa "sin fecha".
fn format_mp4_time(seconds: u64) -> Option<String> {
    if seconds == 0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1904, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let datetime = epoch.checked_add_signed(Duration::try_seconds(i64::try_from(seconds).ok()?)?)?;
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
