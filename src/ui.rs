// UI layer: terminal flows for each command. Prompts come from
// `dialoguer`, the upload spinner from `indicatif`, colors from crossterm.
// Library errors are printed here and turned into exit codes; only
// terminal failures propagate as `anyhow` errors.

use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ApiClient;
use crate::config::AppContext;
use crate::history::{HistoryStats, HistoryStore, UploadKind, UploadRecord};
use crate::limits::format_size;
use crate::removal::{self, parse_removal_input};
use crate::upload::{UploadOutcome, Uploader};

const RULE_WIDTH: usize = 80;

/// Print a library error with its hint and return the exit code for it.
pub fn report(e: &crate::Error) -> i32 {
    eprintln!("{} {}", "Error:".red().bold(), e.to_string().red());
    if let Some(hint) = e.hint() {
        eprintln!("{}", hint.yellow());
    }
    e.exit_code()
}

/// Ensure the path exists and make it absolute.
fn resolve_path(input: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(input).ok()
}

fn spinner(msg: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// `pinme upload [path]`. Asks for the path when none is given.
pub fn run_upload(ctx: &AppContext, path: Option<PathBuf>) -> Result<i32> {
    let input = match path {
        Some(p) => p,
        None => {
            let answer: String = Input::new().with_prompt("path to upload").interact_text()?;
            if answer.trim().is_empty() {
                return Ok(0);
            }
            PathBuf::from(answer.trim())
        }
    };

    let Some(absolute) = resolve_path(&input) else {
        println!("{}", format!("path {} does not exist", input.display()).red());
        return Ok(1);
    };

    println!("{}", format!("uploading {} to ipfs...", absolute.display()).blue());

    let uploader = match Uploader::from_context(ctx) {
        Ok(u) => u,
        Err(e) => return Ok(report(&e)),
    };

    let progress = spinner(format!("Uploading {} to glitter ipfs...", absolute.display()))?;
    let result = uploader.upload(&absolute);
    progress.finish_and_clear();

    match result {
        Ok(outcome) => {
            print_outcome(ctx, &absolute, &outcome);
            Ok(0)
        }
        Err(e) => Ok(report(&e)),
    }
}

fn print_outcome(ctx: &AppContext, path: &Path, outcome: &UploadOutcome) {
    println!(
        "{}",
        format!("Successfully uploaded {} to glitter ipfs", path.display()).green()
    );
    println!("{}", format!("IPFS CID: {}", outcome.content_hash).cyan());
    if let Some(prefix) = &ctx.settings.preview_url {
        println!("{}", "URL:".cyan());
        println!("{}", format!("{}{}", prefix, outcome.content_hash).cyan());
    }
    if let Some(alias) = &outcome.short_alias {
        println!("{}", format!("ENS URL: {}", ens_url(alias)).cyan());
    }
    if let Some(err) = &outcome.history_error {
        println!("{}", format!("Error saving upload history: {}", err).yellow());
    }
}

fn ens_url(alias: &str) -> String {
    format!("https://{}.pinit.eth.limo", alias)
}

/// `pinme rm [target]`. Without a target, confirms twice around a prompt.
pub fn run_remove(ctx: &AppContext, target: Option<String>) -> Result<i32> {
    let api = match ApiClient::from_context(ctx) {
        Ok(api) => api,
        Err(e) => return Ok(report(&e)),
    };

    let raw = match target {
        Some(t) => t,
        None => match prompt_removal_target()? {
            Some(t) => t,
            None => {
                println!("{}", "Operation cancelled".yellow());
                return Ok(0);
            }
        },
    };

    if let Some(parsed) = parse_removal_input(&raw) {
        println!(
            "{}",
            format!("Removing content from IPFS: {}...", parsed.value).blue()
        );
    }

    match removal::remove(&api, &raw) {
        Ok(removed) => {
            println!("{}", "✓ Removal successful!".green());
            println!(
                "{}",
                format!(
                    "Content {}: {} has been removed from IPFS network",
                    removed.kind, removed.value
                )
                .cyan()
            );
            Ok(0)
        }
        Err(e) => {
            if !matches!(e, crate::Error::InvalidInput(_)) {
                eprintln!("{}", "✗ Removal failed".red());
            }
            Ok(report(&e))
        }
    }
}

/// Interactive removal. `None` means the user backed out.
fn prompt_removal_target() -> Result<Option<String>> {
    println!(
        "{}",
        "⚠️  Warning: This action will permanently remove the content from IPFS network".yellow()
    );
    println!("{}", "⚠️  Make sure you have the correct IPFS hash".yellow());
    println!();

    if !Confirm::new()
        .with_prompt("Do you want to continue?")
        .default(false)
        .interact()?
    {
        return Ok(None);
    }

    let answer: String = Input::new()
        .with_prompt("Enter IPFS hash, subname, or URL to remove")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                return Err("Please enter an IPFS hash, subname, or URL");
            }
            match parse_removal_input(input) {
                Some(_) => Ok(()),
                None => Err("Invalid format. Supported: IPFS hash, full URL (*.pinme.dev), subname, or subname URL (*.pinit.eth.limo)"),
            }
        })
        .interact_text()?;

    let Some(parsed) = parse_removal_input(&answer) else {
        return Ok(None);
    };

    let sure = Confirm::new()
        .with_prompt(format!(
            "Are you sure you want to remove {}: {}?",
            parsed.kind, parsed.value
        ))
        .default(false)
        .interact()?;

    Ok(sure.then(|| answer.trim().to_string()))
}

/// `pinme list`. Renders up to `limit` records followed by totals.
pub fn show_history(history: &HistoryStore, limit: usize) -> i32 {
    let records = match history.list(limit) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", format!("Error reading upload history: {}", e).red());
            return e.exit_code();
        }
    };

    if records.is_empty() {
        println!("{}", "No upload history found.".yellow());
        return 0;
    }

    println!("{}", "Upload History:".cyan());
    println!("{}", "-".repeat(RULE_WIDTH).cyan());
    for (index, record) in records.iter().enumerate() {
        print_record(index + 1, record);
        println!("{}", "-".repeat(RULE_WIDTH).cyan());
    }

    let stats = HistoryStats::of(&records);
    println!("{}", format!("Total Uploads: {}", stats.uploads).bold());
    println!("{}", format!("Total Files: {}", stats.files).bold());
    println!("{}", format!("Total Size: {}", format_size(stats.bytes)).bold());
    0
}

fn print_record(position: usize, record: &UploadRecord) {
    println!("{}", format!("{}. {}", position, record.display_name).green());
    println!("   Path: {}", record.source_path);
    println!("   IPFS CID: {}", record.content_hash);
    if let Some(alias) = &record.short_alias {
        println!("   ENS URL: {}", ens_url(alias));
    }
    println!("   Size: {}", format_size(record.size_bytes));
    println!("   Files: {}", record.file_count);
    let kind = match record.kind {
        UploadKind::Directory => "Directory",
        UploadKind::File => "File",
    };
    println!("   Type: {}", kind);
    println!("   Date: {}", record.local_time());
}

/// `pinme list --clear`.
pub fn clear_history(history: &HistoryStore) -> i32 {
    match history.clear() {
        Ok(()) => {
            println!("{}", "Upload history cleared successfully.".green());
            0
        }
        Err(e) => {
            eprintln!("{}", format!("Error clearing upload history: {}", e).red());
            e.exit_code()
        }
    }
}
