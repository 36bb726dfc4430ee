use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::debug;

use crate::date::ResolvedTimestamp;
use crate::recording::Recording;

/// What the executor should do with a planned entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    /// Destination is free, transfer the file.
    Transfer,
    /// Destination already holds an identical-size copy from a prior run.
    SkipDuplicate,
    /// Destination exists with a different size (or two sources map to the
    /// same destination). Needs manual resolution; never overwritten.
    Conflict,
}

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub recording: Recording,
    pub resolved: ResolvedTimestamp,
    pub dest: PathBuf,
    pub action: PlannedAction,
}

/// Ordered execution plan plus the recordings that could not be placed.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub entries: Vec<PlanEntry>,
    /// Recordings with no resolvable timestamp; surfaced to the caller,
    /// never silently dropped.
    pub unplaced: Vec<Recording>,
}

impl ImportPlan {
    pub fn transfer_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.action == PlannedAction::Transfer)
            .count()
    }
}

/// Destination path: `<output>/<MM>-<MonthName>/<DD>/<filename>`.
/// chrono's %B is always the English month name.
pub fn dest_path(output: &Path, date: &NaiveDateTime, filename: &str) -> PathBuf {
    output
        .join(date.format("%m-%B").to_string())
        .join(date.format("%d").to_string())
        .join(filename)
}

/// Recursively collect existing files with sizes so collision checks are a
/// map lookup instead of a stat per entry.
fn scan_existing_files(dir: &Path) -> HashMap<PathBuf, u64> {
    let mut files = HashMap::new();
    scan_existing_files_recursive(dir, &mut files);
    files
}

fn scan_existing_files_recursive(dir: &Path, files: &mut HashMap<PathBuf, u64>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_existing_files_recursive(&path, files);
        } else if let Ok(meta) = entry.metadata() {
            files.insert(path, meta.len());
        }
    }
}

/// Map each resolved recording to a destination and classify it against the
/// current output tree. Entry order follows the input order (folder lexical
/// order, file lexical order within folder).
pub fn build_plan(
    recordings: Vec<(Recording, Option<ResolvedTimestamp>)>,
    output: &Path,
) -> ImportPlan {
    let existing = if output.exists() {
        scan_existing_files(output)
    } else {
        HashMap::new()
    };

    let mut used_paths: HashSet<PathBuf> = HashSet::new();
    let mut plan = ImportPlan::default();

    for (recording, resolved) in recordings {
        let Some(resolved) = resolved else {
            debug!("no timestamp for {}, leaving unplaced", recording.filename);
            plan.unplaced.push(recording);
            continue;
        };

        let dest = dest_path(output, &resolved.date, &recording.filename);

        let action = if used_paths.contains(&dest) {
            // Same filename from two source folders; the later one loses.
            PlannedAction::Conflict
        } else {
            match existing.get(&dest) {
                None => PlannedAction::Transfer,
                Some(&size) if size == recording.size => PlannedAction::SkipDuplicate,
                Some(_) => PlannedAction::Conflict,
            }
        };

        used_paths.insert(dest.clone());
        plan.entries.push(PlanEntry {
            recording,
            resolved,
            dest,
            action,
        });
    }

    plan
}
