pub mod cancel;
pub mod date;
pub mod device;
pub mod executor;
pub mod plan;
pub mod recording;
pub mod scan;
pub mod tag;

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use cancel::CancellationToken;
pub use date::{ResolvedTimestamp, TimestampSource};
pub use executor::{EntryResult, ImportResult, Outcome};
pub use plan::{ImportPlan, PlanEntry, PlannedAction};
pub use recording::Recording;
pub use scan::FolderListing;

/// Transfer semantics for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    Copy,
    Move,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Copy => write!(f, "copy"),
            ImportMode::Move => write!(f, "move"),
        }
    }
}

fn default_excluded_folders() -> Vec<String> {
    vec!["RADIO01".to_string()]
}

/// Everything an import run needs, passed explicitly - the core holds no
/// global state, so runs are deterministic and testable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Recordings root on the mounted device.
    pub source_root: PathBuf,
    /// Output root for the date-partitioned tree.
    pub output: PathBuf,
    /// Folder names never scanned (case-insensitive).
    #[serde(default = "default_excluded_folders")]
    pub excluded_folders: Vec<String>,
    #[serde(default)]
    pub mode: ImportMode,
}

/// Type alias for progress callback: (stage, current, total, message)
pub type ProgressCallback = dyn Fn(&str, u64, u64, &str) + Send + Sync;

/// Throttled progress reporter - emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(Instant::now() - std::time::Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let mut last = self.last_emit.lock().unwrap();
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Enumerate the device's folders and recordings without importing
/// anything (listing mode).
pub fn list(options: &ImportOptions) -> anyhow::Result<Vec<FolderListing>> {
    scan::scan_source(&options.source_root, &options.excluded_folders)
}

/// Scan the device, resolve a timestamp per recording, and build the
/// execution plan. No filesystem writes happen here.
pub fn plan(options: &ImportOptions, progress: &ProgressCallback) -> anyhow::Result<ImportPlan> {
    let tp = ThrottledProgress::new(progress);
    let folders = scan::scan_source(&options.source_root, &options.excluded_folders)?;

    let total: u64 = folders.iter().map(|f| f.recordings.len() as u64).sum();
    let mut resolved = Vec::with_capacity(total as usize);
    let mut current = 0u64;

    for folder in folders {
        for rec in folder.recordings {
            tp.report("resolve", current, total, &rec.filename);
            current += 1;

            let device_meta = tag::read_device_metadata(&rec.path);
            let filename_ts = date::parse_filename_timestamp(&rec.filename);
            let ts = date::resolve_timestamp(device_meta.as_ref(), filename_ts.as_ref());
            resolved.push((rec, ts));
        }
    }

    Ok(plan::build_plan(resolved, &options.output))
}

/// Execute a plan. See [`executor::execute_plan`].
pub fn execute(
    plan: &ImportPlan,
    mode: ImportMode,
    progress: &ProgressCallback,
    cancel: Option<&CancellationToken>,
) -> ImportResult {
    executor::execute_plan(plan, mode, progress, cancel)
}

/// Full pipeline: plan, then execute.
pub fn import(
    options: &ImportOptions,
    progress: &ProgressCallback,
    cancel: Option<&CancellationToken>,
) -> anyhow::Result<ImportResult> {
    let p = plan(options, progress)?;
    Ok(execute(&p, options.mode, progress, cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_full_pipeline_on_plain_files() {
        let device = tempdir().unwrap();
        let out = tempdir().unwrap();
        let folder = device.path().join("FOLDER01");
        fs::create_dir(&folder).unwrap();
        // No tag container; placement falls back to the filename.
        fs::write(folder.join("260203_1536.mp3"), b"recording one").unwrap();
        fs::write(folder.join("memo.mp3"), b"no timestamp").unwrap();
        fs::create_dir(device.path().join("RADIO01")).unwrap();
        fs::write(device.path().join("RADIO01").join("260101_0900.mp3"), b"fm").unwrap();

        let options = ImportOptions {
            source_root: device.path().to_path_buf(),
            output: out.path().to_path_buf(),
            excluded_folders: default_excluded_folders(),
            mode: ImportMode::Copy,
        };

        let result = import(&options, &|_, _, _, _| {}, None).unwrap();
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.unplaced, 1);
        assert!(out
            .path()
            .join("02-February/03/260203_1536.mp3")
            .exists());
        // The excluded folder's file was never considered.
        assert_eq!(result.total(), 2);

        // Second run over the same tree only skips.
        let again = import(&options, &|_, _, _, _| {}, None).unwrap();
        assert_eq!(again.succeeded, 0);
        assert_eq!(again.skipped_duplicates, 1);
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: ImportOptions = serde_json::from_str(
            r#"{"source_root": "/mnt/rec", "output": "/out"}"#,
        )
        .unwrap();
        assert_eq!(options.excluded_folders, vec!["RADIO01".to_string()]);
        assert_eq!(options.mode, ImportMode::Copy);
    }
}
