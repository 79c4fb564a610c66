//! Output formatting for CLI commands
//!
//! Templates render as JSON or YAML; deployed outputs additionally render as
//! a plain table.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::engine::StackOutputsRecord;
use crate::template::Template;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "table" => Ok(OutputFormat::Table),
            _ => anyhow::bail!(
                "Unsupported output format: '{}'. Use 'json', 'yaml', or 'table'.",
                s
            ),
        }
    }
}

/// Render a template in a document format
pub fn render_template(template: &Template, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => template.to_json().context("Failed to render template as JSON"),
        OutputFormat::Yaml => template.to_yaml().context("Failed to render template as YAML"),
        OutputFormat::Table => anyhow::bail!("Templates can only be rendered as JSON or YAML"),
    }
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize>(data: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(data).context("Failed to serialize to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Print the outputs of one deployed stack
pub fn print_outputs(record: &StackOutputsRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Yaml => print_yaml(record),
        OutputFormat::Table => {
            println!("Stack: {} ({}, {})", record.stack.name, record.stack.region, record.stack.account);
            print_table_header(&[("NAME", 20), ("EXPORT", 20), ("VALUE", 70)]);
            for (name, output) in &record.outputs {
                println!(
                    "{:<20} {:<20} {}",
                    truncate(name, 20),
                    truncate(output.export_name.as_deref().unwrap_or("-"), 20),
                    output.value
                );
            }
            Ok(())
        }
    }
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a horizontal separator line
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    println!();
    let mut header = String::new();
    for (name, width) in columns {
        header.push_str(&format!("{:<width$} ", name, width = width));
    }
    println!("{}", header.trim());

    let total_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    print_separator(total_width.saturating_sub(1));
}
