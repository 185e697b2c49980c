//! Output formatting and styling module.
//!
//! Every line the organizer prints goes through [`OutputFormatter`], so the
//! look of moved/skipped/unmatched/failed reports can change in one place.

use colored::*;
use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, on stderr)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use episort::output::OutputFormatter;
    /// OutputFormatter::success("Moved: episode.mkv → Demo/");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message to stderr in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an informational message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The text to print, without any leading symbol
    ///
    /// # Example
    ///
    /// ```no_run
    /// use episort::output::OutputFormatter;
    /// OutputFormatter::info("Organizing contents of: /anime");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a message as is.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` files.
    ///
    /// Print through [`ProgressBar::suspend`] while the bar is active so lines
    /// don't get mangled. The bar stays hidden when stderr is not a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Formats a file time as local date and time, e.g. `2024-04-06 21:30:00`.
    pub fn format_time(time: FileTime) -> String {
        chrono::DateTime::from_timestamp(time.unix_seconds(), time.nanoseconds())
            .map(|utc| {
                utc.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| time.unix_seconds().to_string())
    }

    /// Prints a table of moved files per destination folder.
    ///
    /// ```no_run
    /// use episort::output::OutputFormatter;
    /// use std::collections::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// counts.insert("Frieren".to_string(), 4);
    /// counts.insert("Your Name".to_string(), 1);
    /// OutputFormatter::summary_table(&counts, 5);
    /// ```
    pub fn summary_table(folder_counts: &HashMap<String, usize>, total_files: usize) {
        if folder_counts.is_empty() {
            return;
        }

        Self::header("SUMMARY");

        let mut folders: Vec<_> = folder_counts.iter().collect();
        folders.sort_by_key(|&(name, _)| name);

        let width = folders
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0)
            .max(6); // "Folder"

        println!("{:<width$} | {}", "Folder".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (folder, count) in &folders {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                plural(**count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_is_date_and_time() {
        let formatted = OutputFormatter::format_time(FileTime::from_unix_time(1_600_000_000, 0));
        // Local timezone varies; only the shape is stable
        assert_eq!(formatted.len(), "2020-09-13 12:26:40".len());
        assert!(formatted.starts_with("2020-09-1"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "file");
        assert_eq!(plural(0), "files");
        assert_eq!(plural(7), "files");
    }
}
