//! Output formatting utilities

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Unknown values fall back to `Table`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            _ => Self::Table,
        }
    }
}

/// Prints `data` as JSON or YAML
///
/// Returns `false` for the table format, which callers render themselves.
pub fn print_structured<T: Serialize>(data: &T, format: &str) -> Result<bool> {
    match OutputFormat::parse(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(data)?),
        OutputFormat::Table => return Ok(false),
    }
    Ok(true)
}

/// Two-column key/value table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Colors a write mode cell: production green, dry run yellow
pub fn format_mode(dry_run: bool) -> Cell {
    if dry_run {
        Cell::new("dry run").fg(Color::Yellow)
    } else {
        Cell::new("production").fg(Color::Green)
    }
}

/// Format count in human-readable form
pub fn format_count(count: u64) -> String {
    if count < 1000 {
        count.to_string()
    } else if count < 1_000_000 {
        format!("{:.1}K", count as f64 / 1000.0)
    } else if count < 1_000_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else {
        format!("{:.1}B", count as f64 / 1_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("yml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::parse("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("csv"), OutputFormat::Table);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1500), "1.5K");
        assert_eq!(format_count(2_500_000), "2.5M");
        assert_eq!(format_count(10_000_000_000), "10.0B");
    }

    #[test]
    fn test_format_mode() {
        assert_eq!(format_mode(true).content(), "dry run");
        assert_eq!(format_mode(false).content(), "production");
    }

    #[test]
    fn test_print_structured_skips_table_format() {
        #[derive(Serialize)]
        struct TestData {
            rows: u64,
        }

        assert!(!print_structured(&TestData { rows: 1 }, "table").unwrap());
        assert!(print_structured(&TestData { rows: 1 }, "json").unwrap());
        assert!(print_structured(&TestData { rows: 1 }, "yaml").unwrap());
    }
}
