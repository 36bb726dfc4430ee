use std::path::Path;

use id3::frame::Content;
use id3::Tag;
use log::warn;

use crate::date::{decode_device_block, DeviceMetadata};

/// Read the recorder's metadata block from a file's ID3 container.
///
/// The recorder stores its block as a GEOB (encapsulated object) frame; the
/// description string varies across firmware, so every GEOB frame is tried
/// against the decoder and the first one that decodes wins. A missing tag,
/// an unreadable tag, or a tag without a decodable block all degrade to
/// None so the caller falls back to the filename timestamp.
pub fn read_device_metadata(path: &Path) -> Option<DeviceMetadata> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => return None,
        Err(e) => {
            warn!("failed to read tag from {}: {}", path.display(), e);
            return None;
        }
    };

    let result = tag.frames().find_map(|frame| match frame.content() {
        Content::EncapsulatedObject(obj) => decode_device_block(&obj.data),
        _ => None,
    });
    result
}
