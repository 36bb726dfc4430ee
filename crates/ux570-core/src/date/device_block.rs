use chrono::NaiveDateTime;

/// Nominal length of the recorder's GEOB metadata block.
pub const DEVICE_BLOCK_LEN: usize = 108;

/// A fixed byte range within the device block.
struct FieldSpec {
    offset: usize,
    len: usize,
}

// Layout observed on ICD-UX570 firmware. Everything outside these three
// fields is reserved and varies across firmware versions; those bytes are
// never interpreted.
const F_LENGTH_MARKER: FieldSpec = FieldSpec { offset: 0x00, len: 4 };
const F_MODEL: FieldSpec = FieldSpec { offset: 0x06, len: 12 };
const F_RECORDED_AT: FieldSpec = FieldSpec { offset: 0x50, len: 19 };

/// Expected shape of the timestamp field: '0' marks a digit position,
/// anything else must match literally.
const TIMESTAMP_SHAPE: &[u8; 19] = b"0000-00-00T00:00:00";

fn field<'a>(block: &'a [u8], f: &FieldSpec) -> Option<&'a [u8]> {
    block.get(f.offset..f.offset + f.len)
}

/// Metadata decoded from the recorder's proprietary tag block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMetadata {
    /// Device model string, None if the field was all NUL padding.
    pub model: Option<String>,
    /// Recording timestamp (local wall-clock, seconds precision).
    /// None if the timestamp field was malformed.
    pub recorded_at: Option<NaiveDateTime>,
}

/// Decode the fixed-layout metadata block embedded in a recording's GEOB
/// frame. Returns None when the block is not the expected shape (wrong
/// length, or the big-endian length marker at offset 0 disagrees with the
/// actual length) - callers fall back to the filename timestamp.
pub fn decode_device_block(block: &[u8]) -> Option<DeviceMetadata> {
    let marker = field(block, &F_LENGTH_MARKER)?;
    let declared = u32::from_be_bytes(marker.try_into().ok()?) as usize;
    if block.len() != DEVICE_BLOCK_LEN || declared != block.len() {
        return None;
    }

    // A malformed timestamp invalidates the block for placement purposes,
    // but the model field is still worth reporting.
    let model = field(block, &F_MODEL).and_then(parse_model);
    let recorded_at = field(block, &F_RECORDED_AT).and_then(parse_timestamp);

    Some(DeviceMetadata { model, recorded_at })
}

fn parse_model(raw: &[u8]) -> Option<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let trimmed = &raw[..end];
    if trimmed.is_empty() || !trimmed.is_ascii() {
        return None;
    }
    std::str::from_utf8(trimmed).ok().map(str::to_string)
}

fn parse_timestamp(raw: &[u8]) -> Option<NaiveDateTime> {
    let shape_ok = raw
        .iter()
        .zip(TIMESTAMP_SHAPE.iter())
        .all(|(&b, &t)| if t == b'0' { b.is_ascii_digit() } else { b == t });
    if !shape_ok {
        return None;
    }
    let s = std::str::from_utf8(raw).ok()?;
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(model: &[u8], timestamp: &[u8]) -> Vec<u8> {
        let mut b = vec![0u8; DEVICE_BLOCK_LEN];
        b[0..4].copy_from_slice(&(DEVICE_BLOCK_LEN as u32).to_be_bytes());
        b[0x06..0x06 + model.len()].copy_from_slice(model);
        b[0x50..0x50 + timestamp.len()].copy_from_slice(timestamp);
        b
    }

    #[test]
    fn test_valid_block() {
        let b = block(b"ICD-UX570\0\0\0", b"2026-02-03T15:36:10");
        let meta = decode_device_block(&b).unwrap();
        assert_eq!(meta.model.as_deref(), Some("ICD-UX570"));
        assert_eq!(
            meta.recorded_at.unwrap().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2026-02-03T15:36:10"
        );
    }

    #[test]
    fn test_decode_is_deterministic() {
        let b = block(b"ICD-UX570\0\0\0", b"2026-02-03T15:36:10");
        assert_eq!(decode_device_block(&b), decode_device_block(&b));
    }

    #[test]
    fn test_reserved_bytes_are_opaque() {
        let mut a = block(b"ICD-UX570\0\0\0", b"2026-02-03T15:36:10");
        let mut b = a.clone();
        // Firmware drift in reserved regions must not change the result.
        a[0x20] = 0x00;
        b[0x20] = 0xFF;
        a[0x6A] = 0x13;
        b[0x6A] = 0x37;
        assert_eq!(decode_device_block(&a), decode_device_block(&b));
    }

    #[test]
    fn test_length_marker_mismatch() {
        let mut b = block(b"ICD-UX570\0\0\0", b"2026-02-03T15:36:10");
        b[0..4].copy_from_slice(&200u32.to_be_bytes());
        assert!(decode_device_block(&b).is_none());
    }

    #[test]
    fn test_wrong_block_length() {
        assert!(decode_device_block(&[]).is_none());
        assert!(decode_device_block(&[0, 0, 0, 4]).is_none());
        let mut b = block(b"ICD-UX570\0\0\0", b"2026-02-03T15:36:10");
        b.push(0);
        assert!(decode_device_block(&b).is_none());
    }

    #[test]
    fn test_malformed_timestamp_keeps_model() {
        let b = block(b"ICD-UX570\0\0\0", b"2026/02/03 15:36:10");
        let meta = decode_device_block(&b).unwrap();
        assert_eq!(meta.model.as_deref(), Some("ICD-UX570"));
        assert!(meta.recorded_at.is_none());
    }

    #[test]
    fn test_impossible_calendar_date_rejected() {
        // Shape-valid but not a real date.
        let b = block(b"ICD-UX570\0\0\0", b"2026-13-41T25:66:77");
        assert!(decode_device_block(&b).unwrap().recorded_at.is_none());
    }

    #[test]
    fn test_empty_model_is_unknown() {
        let b = block(b"\0\0\0\0\0\0\0\0\0\0\0\0", b"2026-02-03T15:36:10");
        let meta = decode_device_block(&b).unwrap();
        assert!(meta.model.is_none());
        assert!(meta.recorded_at.is_some());
    }
}
