//! Elementos EBML de Matroska/WebM: cabecera, `Info` y `Tracks` del primer segmento.

use super::{ContainerKind, ContainerMetadata, format_seconds, read_prefix};
use crate::error::ExtractError;
use chrono::{Duration, NaiveDate};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

/// `Info` y `Tracks` suelen estar al principio del segmento.
const HEADER_LIMIT: u64 = 4 * 1024 * 1024;
const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;

const EBML_HEADER: u32 = 0x1A45_DFA3;
const DOC_TYPE: u32 = 0x4282;
const DOC_TYPE_VERSION: u32 = 0x4287;
const SEGMENT: u32 = 0x1853_8067;
const INFO: u32 = 0x1549_A966;
const TIMECODE_SCALE: u32 = 0x2A_D7B1;
const DURATION: u32 = 0x4489;
const TITLE: u32 = 0x7BA9;
const MUXING_APP: u32 = 0x4D80;
const WRITING_APP: u32 = 0x5741;
const DATE_UTC: u32 = 0x4461;
const TRACKS: u32 = 0x1654_AE6B;
const TRACK_ENTRY: u32 = 0xAE;
const TRACK_NUMBER: u32 = 0xD7;
const TRACK_TYPE: u32 = 0x83;
const CODEC_ID: u32 = 0x86;
const TRACK_NAME: u32 = 0x536E;
const LANGUAGE: u32 = 0x22_B59C;
const VIDEO: u32 = 0xE0;
const PIXEL_WIDTH: u32 = 0xB0;
const PIXEL_HEIGHT: u32 = 0xBA;
const AUDIO: u32 = 0xE1;
const SAMPLING_FREQUENCY: u32 = 0xB5;
const CHANNELS: u32 = 0x9F;

pub(super) fn read(path: &Path) -> Result<ContainerMetadata, ExtractError> {
    let mut file = File::open(path)?;
    let data = read_prefix(&mut file, HEADER_LIMIT)?;
    parse(&data)
}

fn parse(data: &[u8]) -> Result<ContainerMetadata, ExtractError> {
    let mut metadata = ContainerMetadata::new(ContainerKind::Matroska);
    let mut seen_header = false;

    for (id, body) in elements(data) {
        match id {
            EBML_HEADER => {
                seen_header = true;
                parse_ebml_header(&mut metadata, body);
            }
            SEGMENT => {
                parse_segment(&mut metadata, body);
                break;
            }
            _ => {}
        }
    }

    if !seen_header {
        return Err(ExtractError::Container("missing EBML header".to_string()));
    }
    Ok(metadata)
}

fn parse_ebml_header(metadata: &mut ContainerMetadata, data: &[u8]) {
    for (id, body) in elements(data) {
        match id {
            DOC_TYPE => metadata.push("Doc type", read_string(body)),
            DOC_TYPE_VERSION => metadata.push("Doc type version", read_uint(body).to_string()),
            _ => {}
        }
    }
}

fn parse_segment(metadata: &mut ContainerMetadata, data: &[u8]) {
    for (id, body) in elements(data) {
        match id {
            INFO => parse_info(metadata, body),
            TRACKS => parse_tracks(metadata, body),
            _ => {}
        }
    }
}

fn parse_info(metadata: &mut ContainerMetadata, data: &[u8]) {
    let mut timecode_scale = DEFAULT_TIMECODE_SCALE;
    let mut duration = None;

    for (id, body) in elements(data) {
        match id {
            TIMECODE_SCALE => timecode_scale = read_uint(body),
            DURATION => duration = read_float(body),
            TITLE => metadata.push("Title", read_string(body)),
            MUXING_APP => metadata.push("Muxing application", read_string(body)),
            WRITING_APP => metadata.push("Writing application", read_string(body)),
            DATE_UTC => {
                if let Some(date) = format_mkv_date(read_int(body)) {
                    metadata.push("Creation date", date);
                }
            }
            _ => {}
        }
    }

    // La duración viene en unidades de `TimecodeScale` nanosegundos.
    if let Some(duration) = duration {
        let seconds = duration * timecode_scale as f64 / 1_000_000_000.0;
        metadata.push("Duration", format_seconds(seconds));
    }
}

fn parse_tracks(metadata: &mut ContainerMetadata, data: &[u8]) {
    let mut count = 0;
    for (id, body) in elements(data) {
        if id != TRACK_ENTRY {
            continue;
        }
        count += 1;
        parse_track_entry(metadata, count, body);
    }
    metadata.push("Tracks", count.to_string());
}

fn parse_track_entry(metadata: &mut ContainerMetadata, index: usize, data: &[u8]) {
    let mut number = index as u64;
    let mut fields = Vec::new();

    for (id, body) in elements(data) {
        match id {
            TRACK_NUMBER => number = read_uint(body),
            TRACK_TYPE => fields.push(("type", track_type_label(read_uint(body)).to_string())),
            CODEC_ID => fields.push(("codec", read_string(body))),
            TRACK_NAME => fields.push(("name", read_string(body))),
            LANGUAGE => fields.push(("language", read_string(body))),
            VIDEO => {
                for (id, body) in elements(body) {
                    match id {
                        PIXEL_WIDTH => fields.push(("width", format!("{} pixels", read_uint(body)))),
                        PIXEL_HEIGHT => {
                            fields.push(("height", format!("{} pixels", read_uint(body))))
                        }
                        _ => {}
                    }
                }
            }
            AUDIO => {
                for (id, body) in elements(body) {
                    match id {
                        SAMPLING_FREQUENCY => {
                            if let Some(rate) = read_float(body) {
                                fields.push(("sample rate", format!("{rate:.0} Hz")));
                            }
                        }
                        CHANNELS => fields.push(("channels", read_uint(body).to_string())),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    for (name, value) in fields {
        metadata.push(format!("Track {number} {name}"), value);
    }
}

fn track_type_label(value: u64) -> &'static str {
    match value {
        1 => "video",
        2 => "audio",
        3 => "complex",
        16 => "logo",
        17 => "subtitles",
        18 => "buttons",
        32 => "control",
        _ => "other",
    }
}

/// Itera los elementos hijos; un tamaño desconocido se extiende hasta el final del búfer.
fn elements(data: &[u8]) -> impl Iterator<Item = (u32, &[u8])> {
    let mut cursor = Cursor::new(data);
    std::iter::from_fn(move || {
        let id = read_element_id(&mut cursor)?;
        let size = read_element_size(&mut cursor)?;
        let start = usize::try_from(cursor.position()).ok()?;
        let end = match size {
            Some(size) => start
                .checked_add(usize::try_from(size).ok()?)?
                .min(data.len()),
            None => data.len(),
        };
        let body = data.get(start..end)?;
        cursor.set_position(end as u64);
        Some((id, body))
    })
}

fn read_element_id(cursor: &mut Cursor<&[u8]>) -> Option<u32> {
    let first = read_byte(cursor)?;
    let length = first.leading_zeros() + 1;
    if length > 4 {
        return None;
    }
    let mut value = u32::from(first);
    for _ in 1..length {
        value = (value << 8) | u32::from(read_byte(cursor)?);
    }
    Some(value)
}

/// `None` interno indica tamaño desconocido (todos los bits de valor en uno).
fn read_element_size(cursor: &mut Cursor<&[u8]>) -> Option<Option<u64>> {
    let first = read_byte(cursor)?;
    let length = first.leading_zeros() + 1;
    if length > 8 {
        return None;
    }
    let mask = if length == 8 { 0 } else { 0xFF_u8 >> length };
    let mut value = u64::from(first & mask);
    for _ in 1..length {
        value = (value << 8) | u64::from(read_byte(cursor)?);
    }
    let unknown = (1_u64 << (7 * length)) - 1;
    Some(if value == unknown { None } else { Some(value) })
}

fn read_byte(cursor: &mut Cursor<&[u8]>) -> Option<u8> {
    let mut byte = [0_u8; 1];
    cursor.read_exact(&mut byte).ok()?;
    Some(byte[0])
}

fn read_uint(data: &[u8]) -> u64 {
    data.iter()
        .take(8)
        .fold(0_u64, |value, byte| (value << 8) | u64::from(*byte))
}

fn read_int(data: &[u8]) -> i64 {
    if data.is_empty() || data.len() > 8 {
        return 0;
    }
    let shift = 64 - 8 * data.len() as u32;
    ((read_uint(data) << shift) as i64) >> shift
}

fn read_float(data: &[u8]) -> Option<f64> {
    match data.len() {
        4 => Some(f64::from(f32::from_be_bytes(data.try_into().ok()?))),
        8 => Some(f64::from_be_bytes(data.try_into().ok()?)),
        _ => None,
    }
}

fn read_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

/// `DateUTC` cuenta nanosegundos desde 2001-01-01.
fn format_mkv_date(nanoseconds: i64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(2001, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let datetime = epoch.checked_add_signed(Duration::nanoseconds(nanoseconds))?;
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: u32, body: &[u8]) -> Vec<u8> {
        let id_bytes = id.to_be_bytes();
        let skip = id_bytes.iter().take_while(|byte| **byte == 0).count();
        let mut data = id_bytes[skip..].to_vec();
        assert!(body.len() < 0x3FFF);
        data.extend_from_slice(&(0x4000_u16 | body.len() as u16).to_be_bytes());
        data.extend_from_slice(body);
        data
    }

    fn sample_webm() -> Vec<u8> {
        let mut header = element(DOC_TYPE, b"webm");
        header.extend(element(DOC_TYPE_VERSION, &[4]));

        let mut info = element(TIMECODE_SCALE, &1_000_000_u32.to_be_bytes());
        info.extend(element(DURATION, &4_500.0_f64.to_be_bytes()));
        info.extend(element(MUXING_APP, b"Lavf60.3.100"));
        info.extend(element(DATE_UTC, &0_i64.to_be_bytes()));

        let mut video = element(PIXEL_WIDTH, &1280_u16.to_be_bytes());
        video.extend(element(PIXEL_HEIGHT, &720_u16.to_be_bytes()));
        let mut entry = element(TRACK_NUMBER, &[1]);
        entry.extend(element(TRACK_TYPE, &[1]));
        entry.extend(element(CODEC_ID, b"V_VP9"));
        entry.extend(element(VIDEO, &video));
        let tracks = element(TRACK_ENTRY, &entry);

        let mut segment_body = element(INFO, &info);
        segment_body.extend(element(TRACKS, &tracks));

        let mut data = element(EBML_HEADER, &header);
        // Segmento con tamaño desconocido, como en una grabación en vivo.
        data.extend_from_slice(&SEGMENT.to_be_bytes());
        data.push(0xFF);
        data.extend(segment_body);
        data
    }

    #[test]
    fn reads_header_info_and_tracks() {
        let metadata = parse(&sample_webm()).unwrap();
        let lines = metadata.export_plaintext();

        assert!(lines.contains(&"Doc type: webm".to_string()));
        assert!(lines.contains(&"Doc type version: 4".to_string()));
        assert!(lines.contains(&"Duration: 4.50 s".to_string()));
        assert!(lines.contains(&"Muxing application: Lavf60.3.100".to_string()));
        assert!(lines.contains(&"Creation date: 2001-01-01 00:00:00".to_string()));
        assert!(lines.contains(&"Track 1 type: video".to_string()));
        assert!(lines.contains(&"Track 1 codec: V_VP9".to_string()));
        assert!(lines.contains(&"Track 1 width: 1280 pixels".to_string()));
        assert!(lines.contains(&"Track 1 height: 720 pixels".to_string()));
        assert!(lines.contains(&"Tracks: 1".to_string()));
    }

    #[test]
    fn variable_length_sizes() {
        let mut cursor = Cursor::new([0x81_u8].as_slice());
        assert_eq!(read_element_size(&mut cursor), Some(Some(1)));

        let mut cursor = Cursor::new([0x40_u8, 0x02].as_slice());
        assert_eq!(read_element_size(&mut cursor), Some(Some(2)));

        let mut cursor = Cursor::new([0xFF_u8].as_slice());
        assert_eq!(read_element_size(&mut cursor), Some(None));
    }

    #[test]
    fn signed_integers_are_sign_extended() {
        assert_eq!(read_int(&[0xFF]), -1);
        assert_eq!(read_int(&[0x00, 0x10]), 16);
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(parse(&[0x00, 0x01, 0x02]).is_err());
    }
}
