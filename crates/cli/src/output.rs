//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&items) {
                println!("{}", json);
            }
        }
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Band name for a channel frequency
pub fn band(frequency_mhz: u32) -> &'static str {
    match frequency_mhz {
        2400..=2500 => "2.4G",
        4900..=5899 => "5G",
        5925..=7125 => "6G",
        _ => "?",
    }
}

/// Format a channel frequency with its band
pub fn format_frequency(frequency_mhz: u32) -> String {
    format!("{} MHz ({})", frequency_mhz, band(frequency_mhz))
}

/// Color signal strength based on value
pub fn color_signal(signal_dbm: i32) -> String {
    let formatted = format!("{} dBm", signal_dbm);
    if signal_dbm >= -60 {
        formatted.green().to_string()
    } else if signal_dbm >= -75 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "offload" | "idle" => status.green().to_string(),
        "degraded" | "netlink" | "scanning" => status.yellow().to_string(),
        "unhealthy" | "defunct" => status.red().to_string(),
        "none" => status.dimmed().to_string(),
        _ => status.to_string(),
    }
}

/// Format a unix timestamp for display
pub fn format_timestamp(secs: i64) -> String {
    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => secs.to_string(),
    }
}
