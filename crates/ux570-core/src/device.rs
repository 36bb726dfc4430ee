use std::fs;
use std::path::{Path, PathBuf};

/// Folder structure the recorder creates on its card, relative to the
/// mount point.
const RECORDINGS_SUBPATH: &[&str] = &["PRIVATE", "SONY", "REC_FILE"];

/// Recordings root for a mounted volume: `<mount>/PRIVATE/SONY/REC_FILE`.
pub fn recordings_root(mount: &Path) -> PathBuf {
    let mut path = mount.to_path_buf();
    path.extend(RECORDINGS_SUBPATH);
    path
}

/// Whether a mounted volume has the recorder's characteristic layout.
pub fn is_recorder_volume(mount: &Path) -> bool {
    recordings_root(mount).is_dir()
}

/// Find the first mounted recorder volume under a mount root such as
/// `/media/<username>`, in lexical order. Returns its recordings root.
pub fn detect_recorder(media_root: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(media_root).ok()?;
    let mut mounts: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    mounts.sort();
    mounts
        .into_iter()
        .find(|m| is_recorder_volume(m))
        .map(|m| recordings_root(&m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_recordings_root() {
        assert_eq!(
            recordings_root(Path::new("/media/user/DVR_SD")),
            PathBuf::from("/media/user/DVR_SD/PRIVATE/SONY/REC_FILE")
        );
    }

    #[test]
    fn test_detect_recorder() {
        let media = tempdir().unwrap();
        fs::create_dir_all(media.path().join("USB_STICK/photos")).unwrap();
        fs::create_dir_all(media.path().join("DVR_SD/PRIVATE/SONY/REC_FILE")).unwrap();

        let found = detect_recorder(media.path()).unwrap();
        assert_eq!(
            found,
            media.path().join("DVR_SD/PRIVATE/SONY/REC_FILE")
        );
    }

    #[test]
    fn test_detect_nothing() {
        let media = tempdir().unwrap();
        fs::create_dir_all(media.path().join("USB_STICK")).unwrap();
        assert!(detect_recorder(media.path()).is_none());
        assert!(detect_recorder(&media.path().join("missing")).is_none());
    }
}
