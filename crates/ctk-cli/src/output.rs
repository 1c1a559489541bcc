//! Output formatting utilities.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Colors a test outcome label for table cells.
#[must_use]
pub fn outcome_label(outcome: &str) -> String {
    match outcome {
        "PASS" => outcome.green().bold().to_string(),
        "FAIL" => outcome.red().bold().to_string(),
        _ => outcome.yellow().bold().to_string(),
    }
}

/// Outputs rows in the specified format.
///
/// # Errors
///
/// Returns a JSON error if a row cannot be serialized.
pub fn output<T: Tabled + serde::Serialize>(
    data: &[T],
    format: OutputFormat,
) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                info("No results found.");
            } else {
                let table = Table::new(data).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}

/// Outputs a single item; tables fall back to the given text rendering.
///
/// # Errors
///
/// Returns a JSON error if the item cannot be serialized.
pub fn output_single<T: serde::Serialize>(
    item: &T,
    text: &str,
    format: OutputFormat,
) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => print!("{text}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
    }
    Ok(())
}
