pub mod device_block;
pub mod filename;

use std::fmt;

use chrono::NaiveDateTime;

pub use device_block::{decode_device_block, DeviceMetadata, DEVICE_BLOCK_LEN};
pub use filename::{parse_filename_timestamp, FilenameTimestamp};

/// Where a resolved timestamp came from, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// Decoded from the tag's device metadata block (seconds precision).
    DeviceMetadata,
    /// Parsed from the filename (minute precision, seconds zeroed).
    Filename,
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampSource::DeviceMetadata => write!(f, "device-metadata"),
            TimestampSource::Filename => write!(f, "filename"),
        }
    }
}

/// The single timestamp chosen for placing a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub date: NaiveDateTime,
    pub source: TimestampSource,
}

/// Pick one timestamp from the available sources, in priority order.
/// The device block is authoritative when present; the two sources are not
/// cross-checked against each other.
pub fn resolve_timestamp(
    device: Option<&DeviceMetadata>,
    filename_ts: Option<&FilenameTimestamp>,
) -> Option<ResolvedTimestamp> {
    if let Some(date) = device.and_then(|d| d.recorded_at) {
        return Some(ResolvedTimestamp {
            date,
            source: TimestampSource::DeviceMetadata,
        });
    }

    if let Some(date) = filename_ts.and_then(|ts| ts.to_datetime()) {
        return Some(ResolvedTimestamp {
            date,
            source: TimestampSource::Filename,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_meta(ts: &str) -> DeviceMetadata {
        DeviceMetadata {
            model: Some("ICD-UX570".to_string()),
            recorded_at: NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S").ok(),
        }
    }

    #[test]
    fn test_device_metadata_wins() {
        let device = device_meta("2026-02-03T15:36:10");
        let fname = parse_filename_timestamp("260203_1536.mp3");
        let resolved = resolve_timestamp(Some(&device), fname.as_ref()).unwrap();
        assert_eq!(resolved.source, TimestampSource::DeviceMetadata);
        assert_eq!(
            resolved.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2026-02-03T15:36:10"
        );
    }

    #[test]
    fn test_filename_fallback() {
        let fname = parse_filename_timestamp("260203_1536.mp3");
        let resolved = resolve_timestamp(None, fname.as_ref()).unwrap();
        assert_eq!(resolved.source, TimestampSource::Filename);
        assert_eq!(
            resolved.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2026-02-03T15:36:00"
        );
    }

    #[test]
    fn test_invalid_block_falls_back_to_filename() {
        // Block decoded but its timestamp field was malformed.
        let device = DeviceMetadata {
            model: Some("ICD-UX570".to_string()),
            recorded_at: None,
        };
        let fname = parse_filename_timestamp("260203_1536.mp3");
        let resolved = resolve_timestamp(Some(&device), fname.as_ref()).unwrap();
        assert_eq!(resolved.source, TimestampSource::Filename);
    }

    #[test]
    fn test_unresolvable() {
        assert!(resolve_timestamp(None, None).is_none());
    }
}
