use colored::Colorize;

use crate::checker::{AuditResult, Level};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// Render audit results in the requested format.
pub fn format_results(results: &[AuditResult], opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(results).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(results).unwrap_or_default(),
        OutputFormat::Text => format_text(results, opts)
    }
}

fn paint_level(level: Level, colored: bool) -> String {
    let label = format!("[{}]", level);
    if !colored {
        return label;
    }
    match level {
        Level::Pass | Level::Info => label.green().bold().to_string(),
        Level::Notice => label.cyan().bold().to_string(),
        Level::Warn | Level::Warning => label.yellow().bold().to_string(),
        Level::Error => label.red().bold().to_string()
    }
}

fn format_text(results: &[AuditResult], opts: &OutputOptions) -> String {
    let mut output = String::new();

    for (i, result) in results.iter().enumerate() {
        let kind = if result.sql_type.is_empty() { "-" } else { result.sql_type.as_str() };
        let header = format!("#{} {} {}", i + 1, paint_level(result.level, opts.colored), kind);
        output.push_str(&header);
        output.push('\n');

        if !result.query.is_empty() {
            if opts.colored {
                output.push_str(&result.query.dimmed().to_string());
            } else {
                output.push_str(&result.query);
            }
            output.push('\n');
        }
        for message in &result.messages {
            output.push_str(&format!("  - {}\n", message));
        }
        if result.affected_rows > 0 {
            output.push_str(&format!("  预计影响行数: {}\n", result.affected_rows));
        }
        output.push('\n');
    }

    let warned = results.iter().filter(|r| r.level.is_warning()).count();
    let footer = format!("共{}条结果，{}条需要修改", results.len(), warned);
    if opts.colored {
        let footer = if warned > 0 { footer.yellow() } else { footer.green() };
        output.push_str(&footer.bold().to_string());
    } else {
        output.push_str(&footer);
    }
    output.push('\n');
    output
}

/// One statement per block, separated by `;` and a blank line.
pub fn format_statements(statements: &[String]) -> String {
    statements
        .iter()
        .map(|s| format!("{};\n", s))
        .collect::<Vec<_>>()
        .join("\n")
}
