//! EXIF decoder backed by kamadak-exif.

use super::{DecodedTags, MetadataDecoder};
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads camera make/model and capture time from EXIF data
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDecoder;

impl MetadataDecoder for ExifDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedTags, String> {
        let file = File::open(path).map_err(|e| e.to_string())?;
        let mut bufreader = BufReader::new(file);
        let exif_reader = Reader::new()
            .read_from_container(&mut bufreader)
            .map_err(|e| e.to_string())?;

        let make = exif_reader
            .get_field(Tag::Make, In::PRIMARY)
            .and_then(|field| get_string_value(&field.value));
        let model = exif_reader
            .get_field(Tag::Model, In::PRIMARY)
            .and_then(|field| get_string_value(&field.value));

        // DateTimeOriginal is when the shutter fired; DateTime is the last edit
        let capture_time = [Tag::DateTimeOriginal, Tag::DateTime]
            .into_iter()
            .filter_map(|tag| exif_reader.get_field(tag, In::PRIMARY))
            .find_map(|field| get_string_value(&field.value).and_then(|s| parse_exif_datetime(&s)));

        Ok(DecodedTags {
            make,
            model,
            capture_time,
        })
    }
}

/// Parse the EXIF "YYYY:MM:DD HH:MM:SS" format
pub(crate) fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim().trim_matches('"').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
