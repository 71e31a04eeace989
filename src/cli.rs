//! Command-line interface module for sortbox.
//!
//! This module handles all CLI-related functionality including:
//! - Flag parsing
//! - Mapping flags onto [`RunOptions`]
//! - Orchestrating the load, scan, transfer and report stages

use crate::config::ConfigSource;
use crate::error::Result;
use crate::file_organizer::{ConflictPolicy, FileOrganizer, TransferMode, TransferReport};
use crate::output::OutputFormatter;
use crate::scanner::{Classification, ScanOptions, Scanner};
use clap::Parser;
use simplelog::LevelFilter;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Default directory scanned when no root is given.
pub const DEFAULT_ROOT: &str = ".";

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "organized";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Sort files into category folders by extension"
)]
pub struct Cli {
    /// Directory to scan recursively
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Directory that receives the category folders
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Read the extension map from this JSON file instead of config.json beside the executable
    #[arg(long, value_name = "FILE", conflicts_with = "builtin")]
    pub config: Option<PathBuf>,

    /// Use the built-in document/image extension map
    #[arg(long)]
    pub builtin: bool,

    /// Move files instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,

    /// What to do when a destination file already exists
    #[arg(long, value_enum, default_value_t = ConflictPolicy::Overwrite)]
    pub on_conflict: ConflictPolicy,

    /// Glob pattern for files or directories to leave alone (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Show what would be transferred without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Exit right away instead of waiting for Enter
    #[arg(long)]
    pub no_wait: bool,

    /// Exit with a non-zero status when the run fails
    #[arg(long)]
    pub fail_on_error: bool,

    /// Log level for terminal diagnostics (off, error, warn, info, debug, trace)
    #[arg(long, default_value_t = LevelFilter::Warn)]
    pub log_level: LevelFilter,

    /// Also write debug logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Builds the run options described by these flags.
    pub fn run_options(&self) -> RunOptions {
        let config = if self.builtin {
            ConfigSource::Builtin
        } else if let Some(path) = &self.config {
            ConfigSource::File(path.clone())
        } else {
            ConfigSource::BesideExecutable
        };

        RunOptions {
            root: self.root.clone(),
            output: self.output.clone(),
            config,
            mode: if self.move_files {
                TransferMode::Move
            } else {
                TransferMode::Copy
            },
            conflict: self.on_conflict,
            exclude: self.exclude.clone(),
            dry_run: self.dry_run,
        }
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    pub config: ConfigSource,
    pub mode: TransferMode,
    pub conflict: ConflictPolicy,
    pub exclude: Vec<String>,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            config: ConfigSource::default(),
            mode: TransferMode::default(),
            conflict: ConflictPolicy::default(),
            exclude: Vec::new(),
            dry_run: false,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub classification: Classification,
    pub report: TransferReport,
    pub elapsed: Duration,
}

/// Runs the load, scan, transfer and report stages in order.
///
/// The first failing stage ends the run. The classification summary is still
/// printed when the transfer stage fails, so the user can see which files
/// were involved.
///
/// # Examples
///
/// ```no_run
/// use sortbox::cli::{RunOptions, run};
/// use sortbox::config::ConfigSource;
///
/// let options = RunOptions {
///     config: ConfigSource::Builtin,
///     ..Default::default()
/// };
/// match run(&options) {
///     Ok(summary) => println!("{} files classified", summary.classification.len()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let map = options.config.load()?;
    OutputFormatter::plain(&format!("Loaded extension map: {}", map));

    let start = Instant::now();

    let scan_options = ScanOptions {
        skip_dir: Some(options.output.clone()),
        exclude: options.exclude.clone(),
    };
    let classification = Scanner::new(&map, &scan_options)?.scan(&options.root)?;

    if options.dry_run {
        OutputFormatter::info("DRY RUN: no files will be changed");
    }
    let organizer = FileOrganizer::new(&options.output)
        .with_mode(options.mode)
        .with_conflict_policy(options.conflict)
        .with_dry_run(options.dry_run);
    let transferred = organizer.transfer_all(&classification);

    OutputFormatter::print_classification(&classification);
    OutputFormatter::summary_table(&classification.category_counts(), classification.len());
    let elapsed = start.elapsed();
    OutputFormatter::elapsed(elapsed);

    let report = transferred?;
    if !options.dry_run {
        OutputFormatter::success(&format!(
            "{} files {}, {} skipped",
            report.transferred.len(),
            options.mode.past_tense().to_lowercase(),
            report.skipped.len()
        ));
    }
    Ok(RunSummary {
        classification,
        report,
        elapsed,
    })
}

/// Blocks until the user presses Enter (or stdin closes).
pub fn wait_for_enter() -> io::Result<()> {
    OutputFormatter::plain("\nPress Enter to exit...");
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(())
}
