//! Información técnica y etiquetas de audio mediante Symphonia.

use crate::error::ExtractError;
use crate::formatting::format_seconds;
use crate::metadata::MetadataRecord;
use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::CodecParameters;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use symphonia::core::probe::Hint;

use super::MetadataExtractor;

const TECH_PREFIX: &str = "AUDIO_TECH_";
const TAG_PREFIX: &str = "AUDIO_TAG_";

pub struct AudioExtractor;

impl MetadataExtractor for AudioExtractor {
    fn extract(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        let file = File::open(path)?;
        let file_size = file.metadata().map(|metadata| metadata.len()).ok();
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mut probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let mut record = MetadataRecord::new();

        if let Some(track) = probed.format.default_track() {
            for (name, value) in technical_fields(&track.codec_params, file_size) {
                record.insert(format!("{TECH_PREFIX}{name}"), value);
            }
        }

        // Etiquetas previas al flujo (p. ej. ID3v2) y luego las del contenedor.
        if let Some(metadata) = probed.metadata.get()
            && let Some(revision) = metadata.current()
        {
            insert_tags(&mut record, revision);
        }
        if let Some(revision) = probed.format.metadata().current() {
            insert_tags(&mut record, revision);
        }

        Ok(record)
    }
}

/// Campos técnicos conocidos, en lugar de enumerar atributos dinámicamente.
fn technical_fields(
    params: &CodecParameters,
    file_size: Option<u64>,
) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();

    if let Some(descriptor) = symphonia::default::get_codecs().get_codec(params.codec) {
        fields.push(("codec", descriptor.short_name.to_string()));
    }
    if let Some(rate) = params.sample_rate {
        fields.push(("sample_rate", rate.to_string()));
    }
    if let Some(channels) = params.channels {
        fields.push(("channels", channels.count().to_string()));
    }
    if let Some(bits) = params.bits_per_sample {
        fields.push(("bits_per_sample", bits.to_string()));
    }

    let length = match (params.time_base, params.n_frames) {
        (Some(time_base), Some(frames)) => {
            let time = time_base.calc_time(frames);
            Some(time.seconds as f64 + time.frac)
        }
        _ => None,
    };
    if let Some(length) = length {
        fields.push(("length", format_seconds(length)));

        if let Some(size) = file_size
            && length > 0.0
        {
            let bitrate = (size as f64 * 8.0 / length).round() as u64;
            fields.push(("bitrate", bitrate.to_string()));
        }
    }

    fields
}

fn insert_tags(record: &mut MetadataRecord, revision: &MetadataRevision) {
    for tag in revision.tags() {
        // Las cadenas RIFF INFO e ID3 pueden traer el terminador NUL.
        let value = tag.value.to_string().trim_end_matches('\0').to_string();
        if tag.key.is_empty() || value.trim().is_empty() {
            continue;
        }
        // Las etiquetas repetidas conservan su primer valor.
        record
            .entry(format!("{TAG_PREFIX}{}", tag.key))
            .or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::Channels;
    use symphonia::core::codecs::CODEC_TYPE_PCM_S16LE;
    use symphonia::core::meta::{MetadataBuilder, StandardTagKey, Tag, Value};
    use symphonia::core::units::TimeBase;

    #[test]
    fn technical_fields_follow_allowlist() {
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_PCM_S16LE)
            .with_sample_rate(8_000)
            .with_channels(Channels::FRONT_LEFT | Channels::FRONT_RIGHT)
            .with_bits_per_sample(16)
            .with_time_base(TimeBase::new(1, 8_000))
            .with_n_frames(16_000);

        let fields = technical_fields(&params, Some(64_044));
        let lookup = |name: &str| {
            fields
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        };

        assert_eq!(lookup("sample_rate").as_deref(), Some("8000"));
        assert_eq!(lookup("channels").as_deref(), Some("2"));
        assert_eq!(lookup("bits_per_sample").as_deref(), Some("16"));
        assert_eq!(lookup("length").as_deref(), Some("2.0"));
        assert_eq!(lookup("bitrate").as_deref(), Some("256176"));
        assert!(lookup("codec").is_some());
    }

    #[test]
    fn missing_parameters_are_omitted() {
        let params = CodecParameters::new();
        let fields = technical_fields(&params, None);
        assert!(fields.iter().all(|(name, _)| *name != "sample_rate"));
        assert!(fields.iter().all(|(name, _)| *name != "length"));
    }

    #[test]
    fn repeated_tags_keep_first_value() {
        let mut builder = MetadataBuilder::new();
        builder.add_tag(Tag::new(
            Some(StandardTagKey::Artist),
            "ARTIST",
            Value::String("First".to_string()),
        ));
        builder.add_tag(Tag::new(
            Some(StandardTagKey::Artist),
            "ARTIST",
            Value::String("Second".to_string()),
        ));
        builder.add_tag(Tag::new(None, "COMMENT", Value::String("  ".to_string())));
        builder.add_tag(Tag::new(None, "INAM", Value::String("Title\0".to_string())));
        builder.add_tag(Tag::new(None, "ICMT", Value::String("\0\0".to_string())));
        let revision = builder.metadata();

        let mut record = MetadataRecord::new();
        insert_tags(&mut record, &revision);

        assert_eq!(
            record.get("AUDIO_TAG_ARTIST").map(String::as_str),
            Some("First")
        );
        assert!(!record.contains_key("AUDIO_TAG_COMMENT"));
        assert_eq!(
            record.get("AUDIO_TAG_INAM").map(String::as_str),
            Some("Title")
        );
        assert!(!record.contains_key("AUDIO_TAG_ICMT"));
    }

    #[test]
    fn garbage_is_rejected_by_probe() {
        let dir = tempfile::Builder::new().prefix("audio").tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, [0_u8; 64]).unwrap();

        assert!(AudioExtractor.extract(&path).is_err());
    }
}
