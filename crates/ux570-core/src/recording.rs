use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File extensions the recorder produces.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "wma"];

/// A source file discovered on the device. Immutable once discovered.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Absolute path on the mounted device
    pub path: PathBuf,
    /// Just the filename
    pub filename: String,
    /// File size in bytes
    pub size: u64,
    /// Filesystem mtime. Advisory only - FAT mtimes on removable media are
    /// unreliable, placement always uses the resolved timestamp.
    pub modified: Option<SystemTime>,
}

impl Recording {
    pub fn new(path: PathBuf, size: u64, modified: Option<SystemTime>) -> Self {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        Self {
            path,
            filename,
            size,
            modified,
        }
    }
}

/// Check whether a filename is one the recorder could have written.
/// The extension allowlist is authoritative; the mime database is only a
/// cross-check for extensions it knows about.
pub fn is_recorder_audio(filename: &str) -> bool {
    let Some(ext) = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return false;
    };

    if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return false;
    }

    mime_guess::from_path(filename)
        .first()
        .map_or(true, |m| m.type_() == mime_guess::mime::AUDIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_extensions() {
        assert!(is_recorder_audio("260203_1536.mp3"));
        assert!(is_recorder_audio("260203_1536.WAV"));
        assert!(is_recorder_audio("note.m4a"));
        assert!(is_recorder_audio("radio.wma"));
    }

    #[test]
    fn test_other_files_rejected() {
        assert!(!is_recorder_audio("MSGLIST.MSF"));
        assert!(!is_recorder_audio("cover.jpg"));
        assert!(!is_recorder_audio("README"));
        assert!(!is_recorder_audio("260203_1536"));
    }

    #[test]
    fn test_filename_from_path() {
        let rec = Recording::new(PathBuf::from("/mnt/FOLDER01/260203_1536.mp3"), 42, None);
        assert_eq!(rec.filename, "260203_1536.mp3");
        assert_eq!(rec.size, 42);
    }
}
