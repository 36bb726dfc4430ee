use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::plan::{ImportPlan, PlanEntry, PlannedAction};
use crate::{ImportMode, ProgressCallback, ThrottledProgress};

/// Per-entry outcome category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Succeeded,
    SkippedDuplicate,
    Conflict,
    Failed,
    Unplaced,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Succeeded => "succeeded",
            Outcome::SkippedDuplicate => "skipped-duplicate",
            Outcome::Conflict => "conflict",
            Outcome::Failed => "failed",
            Outcome::Unplaced => "unplaced",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryResult {
    pub source: PathBuf,
    pub dest: Option<PathBuf>,
    pub outcome: Outcome,
    /// Reason detail for non-succeeded outcomes.
    pub note: Option<String>,
}

/// Batch summary. Created by the executor, never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub succeeded: u64,
    pub skipped_duplicates: u64,
    pub conflicts: u64,
    pub failed: u64,
    pub unplaced: u64,
    /// Per-entry detail in plan order, unplaced recordings last.
    pub details: Vec<EntryResult>,
    /// True when a cancellation request stopped the batch between files.
    pub interrupted: bool,
}

impl ImportResult {
    fn record(&mut self, entry: EntryResult) {
        match entry.outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::SkippedDuplicate => self.skipped_duplicates += 1,
            Outcome::Conflict => self.conflicts += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Unplaced => self.unplaced += 1,
        }
        self.details.push(entry);
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.skipped_duplicates + self.conflicts + self.failed + self.unplaced
    }
}

/// Execute a plan entry by entry, in plan order. Every per-file error is
/// isolated: one bad file never stops the batch. Cancellation is honored
/// between files only, so completed transfers stay valid.
pub fn execute_plan(
    plan: &ImportPlan,
    mode: ImportMode,
    progress: &ProgressCallback,
    cancel: Option<&CancellationToken>,
) -> ImportResult {
    let tp = ThrottledProgress::new(progress);
    let total = plan.entries.len() as u64;
    let mut created_dirs: HashSet<PathBuf> = HashSet::new();
    let mut result = ImportResult::default();

    for (i, entry) in plan.entries.iter().enumerate() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                warn!("import interrupted after {} of {} entries", i, total);
                result.interrupted = true;
                break;
            }
        }
        tp.report("transfer", i as u64, total, &entry.recording.filename);

        match entry.action {
            PlannedAction::SkipDuplicate => result.record(EntryResult {
                source: entry.recording.path.clone(),
                dest: Some(entry.dest.clone()),
                outcome: Outcome::SkippedDuplicate,
                note: Some("identical copy already present".to_string()),
            }),
            PlannedAction::Conflict => result.record(EntryResult {
                source: entry.recording.path.clone(),
                dest: Some(entry.dest.clone()),
                outcome: Outcome::Conflict,
                note: Some(
                    "destination exists with a different size; resolve manually".to_string(),
                ),
            }),
            PlannedAction::Transfer => match transfer(entry, mode, &mut created_dirs) {
                Ok(()) => result.record(EntryResult {
                    source: entry.recording.path.clone(),
                    dest: Some(entry.dest.clone()),
                    outcome: Outcome::Succeeded,
                    note: None,
                }),
                Err(e) => {
                    warn!("{}: {:#}", entry.recording.filename, e);
                    result.record(EntryResult {
                        source: entry.recording.path.clone(),
                        dest: Some(entry.dest.clone()),
                        outcome: Outcome::Failed,
                        note: Some(format!("{:#}", e)),
                    });
                }
            },
        }
    }

    for rec in &plan.unplaced {
        result.record(EntryResult {
            source: rec.path.clone(),
            dest: None,
            outcome: Outcome::Unplaced,
            note: Some("no usable timestamp in tag or filename".to_string()),
        });
    }

    result
}

fn transfer(
    entry: &PlanEntry,
    mode: ImportMode,
    created_dirs: &mut HashSet<PathBuf>,
) -> anyhow::Result<()> {
    let src = &entry.recording.path;
    let dest = &entry.dest;

    if let Some(parent) = dest.parent() {
        if !created_dirs.contains(parent) {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
            created_dirs.insert(parent.to_path_buf());
        }
    }

    copy_contents(src, dest)?;

    // Best-effort mtime from the resolved timestamp; failure is not
    // load-bearing.
    if let Some(local) = entry.resolved.date.and_local_timezone(chrono::Local).single() {
        let ft = filetime::FileTime::from_unix_time(local.timestamp(), 0);
        filetime::set_file_mtime(dest, ft).ok();
    }

    if mode == ImportMode::Move {
        // Source and destination may be on different devices, so a move is
        // copy, verify, then delete. The source survives anything short of
        // a verified destination.
        let written = fs::metadata(dest)
            .with_context(|| format!("cannot stat {}", dest.display()))?
            .len();
        if written != entry.recording.size {
            bail!(
                "destination size {} != source size {} after copy; source left in place",
                written,
                entry.recording.size
            );
        }
        fs::remove_file(src)
            .with_context(|| format!("copy verified but could not remove source {}", src.display()))?;
    }

    Ok(())
}

fn copy_contents(src: &Path, dest: &Path) -> anyhow::Result<()> {
    let mut input = File::open(src).with_context(|| format!("cannot read {}", src.display()))?;
    let mut output = io::BufWriter::new(
        File::create(dest).with_context(|| format!("cannot create {}", dest.display()))?,
    );
    io::copy(&mut input, &mut output)
        .with_context(|| format!("copy to {} failed", dest.display()))?;
    output.flush()?;
    Ok(())
}
