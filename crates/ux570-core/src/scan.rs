use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use log::debug;

use crate::recording::{is_recorder_audio, Recording};

/// One source folder on the device and the recordings it contains,
/// both in lexical order.
#[derive(Debug, Clone)]
pub struct FolderListing {
    pub name: String,
    pub recordings: Vec<Recording>,
}

impl FolderListing {
    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}

/// Enumerate recording folders under the device root, skipping excluded
/// folder names (case-insensitive). A missing or unreadable root is an
/// error; a root with no matching folders is an empty result.
pub fn scan_source(root: &Path, excluded: &[String]) -> anyhow::Result<Vec<FolderListing>> {
    if !root.is_dir() {
        bail!(
            "source path not found: {} (is the recorder connected and mounted?)",
            root.display()
        );
    }

    let entries = fs::read_dir(root)
        .with_context(|| format!("cannot read source path {}", root.display()))?;

    let mut folders: Vec<(String, std::path::PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        // file_type() does not follow symlinks, so a link pointing outside
        // the root is never descended into.
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if excluded.iter().any(|e| e.eq_ignore_ascii_case(&name)) {
            debug!("excluding folder {}", name);
            continue;
        }
        folders.push((name, entry.path()));
    }
    folders.sort_by(|a, b| a.0.cmp(&b.0));

    folders
        .into_iter()
        .map(|(name, path)| {
            let recordings = scan_folder(&path)?;
            debug!("{}: {} recording(s)", name, recordings.len());
            Ok(FolderListing { name, recordings })
        })
        .collect()
}

fn scan_folder(folder: &Path) -> anyhow::Result<Vec<Recording>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("cannot read folder {}", folder.display()))?;

    let mut recordings = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !is_recorder_audio(&filename) {
            continue;
        }
        let meta = entry.metadata()?;
        recordings.push(Recording::new(
            entry.path(),
            meta.len(),
            meta.modified().ok(),
        ));
    }
    recordings.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(recordings)
}
