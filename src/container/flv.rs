use super::{ContainerKind, ContainerMetadata, be_u32, read_up_to};
use crate::error::ExtractError;
use std::fs::File;
use std::path::Path;

const FLAG_AUDIO: u8 = 0x04;
const FLAG_VIDEO: u8 = 0x01;

pub(super) fn read(path: &Path) -> Result<ContainerMetadata, ExtractError> {
    let mut file = File::open(path)?;
    let mut header = [0_u8; 9];
    let read = read_up_to(&mut file, &mut header)?;
    parse(&header[..read])
}

fn parse(header: &[u8]) -> Result<ContainerMetadata, ExtractError> {
    if !header.starts_with(b"FLV") || header.len() < 9 {
        return Err(ExtractError::Container("truncated FLV header".to_string()));
    }

    let mut metadata = ContainerMetadata::new(ContainerKind::Flv);
    let flags = header[4];
    metadata.push("Version", header[3].to_string());
    metadata.push("Has audio", yes_no(flags & FLAG_AUDIO != 0));
    metadata.push("Has video", yes_no(flags & FLAG_VIDEO != 0));
    if let Some(offset) = be_u32(header, 5) {
        metadata.push("Header size", format!("{offset} bytes"));
    }
    Ok(metadata)
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
