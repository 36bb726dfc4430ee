mod config;

use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::config::Config;
use ux570_core::{
    date, device, CancellationToken, ImportMode, ImportOptions, ImportPlan, ImportResult,
    Outcome, PlannedAction,
};

#[derive(Parser)]
#[command(
    name = "ux570-import",
    version,
    about = "Import recordings from a Sony ICD-UX570 voice recorder, organized by recording date"
)]
struct Cli {
    /// Recordings root on the mounted device (default: auto-detect, then config)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Output directory (default: from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Move files off the recorder instead of copying
    #[arg(long = "move", conflicts_with = "copy")]
    move_files: bool,

    /// Copy files, leaving the recorder untouched (default)
    #[arg(long)]
    copy: bool,

    /// List available recordings without importing
    #[arg(long)]
    list: bool,

    /// Show the plan without transferring anything
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Additional folder names to exclude from the scan (repeatable)
    #[arg(long = "exclude", value_name = "FOLDER")]
    excluded: Vec<String>,

    /// Alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp(None).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let source_root = match &cli.source {
        Some(s) => s.clone(),
        None => match device::detect_recorder(&config.media_root()) {
            Some(detected) => {
                debug!("auto-detected recorder at {}", detected.display());
                detected
            }
            None => config.source_root(),
        },
    };

    let mut excluded_folders = config.excluded_folders.clone();
    excluded_folders.extend(cli.excluded.iter().cloned());

    let mode = if cli.move_files {
        ImportMode::Move
    } else if cli.copy {
        ImportMode::Copy
    } else {
        config.default_mode
    };

    let output = cli.output.clone().unwrap_or_else(|| config.output_dir());

    let options = ImportOptions {
        source_root,
        output,
        excluded_folders,
        mode,
    };

    println!("Source: {}", options.source_root.display());

    if cli.list {
        return list_recordings(&options);
    }

    let plan = ux570_core::plan(&options, &|_, _, _, _| {})?;
    print_plan(&plan, &options);

    if cli.dry_run {
        return Ok(());
    }
    if plan.transfer_count() == 0 && plan.unplaced.is_empty() {
        println!("Nothing to import.");
        return Ok(());
    }

    if !cli.yes && !confirm(&plan, &options)? {
        println!("Aborted.");
        return Ok(());
    }

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || token.cancel())?;
    }

    let pb = ProgressBar::new(plan.entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} {msg}")
            .unwrap(),
    );
    let bar = pb.clone();
    let progress = move |_stage: &str, current: u64, _total: u64, message: &str| {
        bar.set_position(current);
        bar.set_message(message.to_string());
    };

    let result = ux570_core::execute(&plan, mode, &progress, Some(&token));
    pb.finish_and_clear();

    print_result(&result, &options);

    if result.interrupted {
        eprintln!("Interrupted; completed transfers are valid.");
    }
    if result.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Listing mode: folders and files with the destination each filename
/// implies. Fast - nothing is read from inside the files.
fn list_recordings(options: &ImportOptions) -> anyhow::Result<()> {
    let folders = ux570_core::list(options)?;
    if folders.is_empty() {
        println!("No recording folders found.");
        return Ok(());
    }

    println!("Found {} folder(s):", folders.len());
    for folder in &folders {
        println!("  {}/  ({} files)", folder.name, folder.len());
        for rec in &folder.recordings {
            let guessed = date::parse_filename_timestamp(&rec.filename)
                .and_then(|ts| ts.to_datetime());
            match guessed {
                Some(dt) => println!("    {}  -> {}/", rec.filename, dt.format("%m-%B/%d")),
                None => println!("    {}  (no filename timestamp)", rec.filename),
            }
        }
    }
    Ok(())
}

fn print_plan(plan: &ImportPlan, options: &ImportOptions) {
    for entry in &plan.entries {
        let rel = pathdiff::diff_paths(&entry.dest, &options.output)
            .unwrap_or_else(|| entry.dest.clone());
        let marker = match entry.action {
            PlannedAction::Transfer => "+",
            PlannedAction::SkipDuplicate => "=",
            PlannedAction::Conflict => "!",
        };
        println!(
            "  {} {}  -> {}  [{}]",
            marker,
            entry.recording.filename,
            rel.display(),
            entry.resolved.source
        );
    }
    for rec in &plan.unplaced {
        println!("  ? {}  (no usable timestamp)", rec.filename);
    }
    println!(
        "{} to transfer, {} duplicate(s), {} conflict(s), {} unplaced",
        plan.transfer_count(),
        plan.entries
            .iter()
            .filter(|e| e.action == PlannedAction::SkipDuplicate)
            .count(),
        plan.entries
            .iter()
            .filter(|e| e.action == PlannedAction::Conflict)
            .count(),
        plan.unplaced.len()
    );
}

fn confirm(plan: &ImportPlan, options: &ImportOptions) -> anyhow::Result<bool> {
    let reply = rprompt::prompt_reply_stdout(&format!(
        "{} {} file(s) to {}? [Y/n]: ",
        match options.mode {
            ImportMode::Copy => "Copy",
            ImportMode::Move => "Move",
        },
        plan.transfer_count(),
        options.output.display()
    ))?;
    let reply = reply.trim().to_ascii_lowercase();
    Ok(reply.is_empty() || reply == "y" || reply == "yes")
}

fn print_result(result: &ImportResult, options: &ImportOptions) {
    println!(
        "Done. {} imported, {} skipped (duplicate), {} conflict(s), {} failed, {} unplaced -> {}",
        result.succeeded,
        result.skipped_duplicates,
        result.conflicts,
        result.failed,
        result.unplaced,
        options.output.display()
    );
    for entry in result.details.iter().filter(|e| e.outcome != Outcome::Succeeded) {
        let note = entry
            .note
            .as_deref()
            .map(|n| format!("  - {}", n))
            .unwrap_or_default();
        println!("  [{}] {}{}", entry.outcome, display_source(entry, options), note);
    }
}

fn display_source(entry: &ux570_core::EntryResult, options: &ImportOptions) -> String {
    pathdiff::diff_paths(&entry.source, &options.source_root)
        .unwrap_or_else(|| entry.source.clone())
        .display()
        .to_string()
}
