//! Output formatting and styling module.
//!
//! Provides a centralized interface for all user-facing output: per-file
//! transfer lines, the final classification summary, the per-category table
//! and the elapsed time. Diagnostics go through the `log` macros instead.

use crate::file_organizer::{Operation, SkippedFile, TransferMode};
use crate::scanner::Classification;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
#[derive(Debug)]
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message with a green checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message to stderr with a red X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message with a yellow warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for the transfer loop.
    ///
    /// The bar draws nothing when stderr is not a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Formats the line printed after a completed transfer, e.g.
    /// `Copied ./a.txt to organized/document/a.txt`.
    pub fn transfer_line(mode: TransferMode, operation: &Operation) -> String {
        format!(
            "{} {} to {}",
            mode.past_tense(),
            operation.original_path.display(),
            operation.new_path.display()
        )
    }

    /// Prints the line for a transfer that was not carried out.
    pub fn skipped(skipped: &SkippedFile) {
        Self::warning(&format!(
            "Skipped {} ({})",
            skipped.original_path.display(),
            skipped.reason
        ));
    }

    /// Prints a dry-run notice for a planned transfer.
    pub fn dry_run_notice(mode: TransferMode, operation: &Operation) {
        println!(
            "{}",
            format!(
                "[DRY RUN] Would {} {} to {}",
                mode.verb(),
                operation.original_path.display(),
                operation.new_path.display()
            )
            .yellow()
        );
    }

    /// Formats one summary entry as `<path> (<basename>) => <category>`.
    pub fn summary_entry(path: &Path, category: &str) -> String {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        format!("{} ({}) => {}", path.display(), file_name, category)
    }

    /// Prints every classified file with its basename and category.
    pub fn print_classification(classification: &Classification) {
        Self::header("📦 Final file map:");
        if classification.is_empty() {
            Self::plain("No matching files found.");
            return;
        }
        for (path, category) in classification.iter() {
            Self::plain(&Self::summary_entry(path, category));
        }
    }

    /// Prints a summary table with file counts by category.
    pub fn summary_table(category_counts: &BTreeMap<&str, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural_files(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural_files(total_files),
            width = max_category_len
        );
    }

    /// Prints the elapsed wall-clock time of the run.
    pub fn elapsed(duration: Duration) {
        println!("\n⏱ Time taken: {:?}", duration);
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
