// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

mod progress;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use ortho_decals_core::{Conventions, FailurePolicy, PatchOptions, PatchReport};
use progress::TerminalProgress;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ortho-decals",
    author,
    version,
    about = "Fixes terrain decals for Ortho4XP tiles in X-Plane Vulkan",
    long_about = None
)]
struct Cli {
    /// Paths to ortho-scenery folder(s)
    #[arg(required = true, num_args = 1..)]
    ortho_paths: Vec<PathBuf>,

    /// Path to backup folder
    #[arg(
        short = 'b',
        long = "backupFolder",
        visible_alias = "backup-folder",
        env = "ORTHO_DECALS_BACKUP"
    )]
    backup_folder: PathBuf,

    /// Keep patching the remaining files when one of them fails
    #[arg(long)]
    keep_going: bool,

    /// Only report which files would be changed
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }

    fn patch_options(&self) -> PatchOptions {
        let policy = if self.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::Abort
        };
        PatchOptions::new(&self.backup_folder)
            .with_failure_policy(policy)
            .with_dry_run(self.dry_run)
    }
}

fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let conventions = Conventions::default();
    let show_progress = !cli.quiet && !cli.json && std::io::stdout().is_terminal();
    let progress = TerminalProgress::new(show_progress);

    if !cli.quiet && !cli.json {
        println!("Searching for terrain-files in given ortho-scenery folders (this may take a while)");
    }

    let report = ortho_decals_core::run(
        &cli.ortho_paths,
        &cli.patch_options(),
        &conventions,
        &progress,
    )
    .context("Failed to fix terrain decals")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !cli.quiet {
        for line in summary(&report, &conventions.marker) {
            println!("{}", line);
        }
    }

    if !report.is_success() {
        for failure in &report.failures {
            eprintln!("{}", failure.error);
        }
        bail!(
            "{} terrain-file(s) could not be updated",
            report.failures.len()
        );
    }

    Ok(())
}

fn summary(report: &PatchReport, marker: &str) -> Vec<String> {
    let mut lines = Vec::new();

    if report.nothing_to_do() {
        lines.push("No terrain files need modifications.".to_string());
        return lines;
    }

    if report.dry_run {
        lines.push(format!(
            "{} terrain-files would be updated with {}:",
            report.patched.len(),
            marker
        ));
        for file in &report.patched {
            lines.push(format!(
                "  {} (backup: {})",
                file.original.display(),
                file.backup.display()
            ));
        }
        return lines;
    }

    lines.push(format!(
        "{} terrain-files have been updated with {}.",
        report.patched.len(),
        marker
    ));
    if !report.patched.is_empty() {
        lines.push(format!(
            "Backups of modified files have been created in {}.",
            report.backup_root.display()
        ));
    }
    lines
}
