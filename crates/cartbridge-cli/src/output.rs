//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output in
//! various formats (JSON, YAML, human-readable), with specialized rendering
//! for transformation outcomes, rule-set problems and migration logs.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use cartbridge_core::{MigrationLog, RuleFailure, TransformOutcome};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the result of one pipeline run
    fn format_outcome(&self, outcome: &TransformOutcome, show_partial: bool) -> Result<String>;

    /// Format the problems found by a rule-set check
    fn format_rule_problems(&self, rule_count: usize, problems: &[RuleFailure]) -> Result<String>;

    /// Format migration logs
    fn format_migration_logs(&self, logs: &[MigrationLog]) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_outcome(&self, outcome: &TransformOutcome, show_partial: bool) -> Result<String> {
        match self {
            OutputFormat::Human => format_outcome_human(outcome, show_partial),
            _ => self.format(&outcome_to_value(outcome, show_partial)),
        }
    }

    fn format_rule_problems(&self, rule_count: usize, problems: &[RuleFailure]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_rule_problems_human(rule_count, problems)),
            _ => self.format(&json!({
                "rules": rule_count,
                "valid": problems.is_empty(),
                "problems": problems.iter().map(failure_to_value).collect::<Vec<_>>(),
            })),
        }
    }

    fn format_migration_logs(&self, logs: &[MigrationLog]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_migration_logs_human(logs)),
            _ => self.format(&logs),
        }
    }
}

/// Machine-readable view of a rule failure
pub fn failure_to_value(failure: &RuleFailure) -> Value {
    json!({
        "rule_index": failure.rule_index,
        "source_field": failure.source_field,
        "dest_field": failure.dest_field,
        "kind": failure.error.kind(),
        "message": failure.error.to_string(),
    })
}

/// Machine-readable view of a run; the partial document is included on request
pub fn outcome_to_value(outcome: &TransformOutcome, show_partial: bool) -> Value {
    let document = if outcome.is_success() || show_partial {
        outcome.document.clone()
    } else {
        Value::Null
    };
    json!({
        "success": outcome.is_success(),
        "applied": outcome.applied,
        "skipped": outcome.skipped,
        "document": document,
        "failure": outcome.failure.as_ref().map(failure_to_value),
    })
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stdout().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);
        trace!(data = %value_json, "Outputting data");

        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a transformation outcome
    pub fn outcome(&mut self, outcome: &TransformOutcome, show_partial: bool) -> Result<()> {
        let formatted = self.format.format_outcome(outcome, show_partial)?;
        self.writeln(formatted.trim_end())
    }

    /// Write the result of a rule-set check
    pub fn rule_problems(&mut self, rule_count: usize, problems: &[RuleFailure]) -> Result<()> {
        let formatted = self.format.format_rule_problems(rule_count, problems)?;
        self.writeln(formatted.trim_end())
    }

    /// Write migration logs
    pub fn migration_logs(&mut self, logs: &[MigrationLog]) -> Result<()> {
        let formatted = self.format.format_migration_logs(logs)?;
        self.writeln(formatted.trim_end())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn format_outcome_human(outcome: &TransformOutcome, show_partial: bool) -> Result<String> {
    let mut output = String::new();

    match &outcome.failure {
        None => {
            output.push_str(&format!(
                "✅ Transformation succeeded ({} applied, {} skipped)\n\n",
                outcome.applied, outcome.skipped
            ));
            output.push_str(&serde_json::to_string_pretty(&outcome.document)?);
            output.push('\n');
        }
        Some(failure) => {
            output.push_str(&format!(
                "❌ Transformation aborted at rule {}\n",
                failure.rule_index
            ));
            output.push_str(&format!(
                "  📍 Rule: {} -> {}\n",
                failure.source_field, failure.dest_field
            ));
            output.push_str(&format!("  🏷️  Kind: {}\n", failure.error.kind()));
            output.push_str(&format!("  💬 Message: {}\n", failure.error));

            if show_partial {
                output.push_str(&format!(
                    "\n📝 Partial document ({} rule(s) applied):\n",
                    outcome.applied
                ));
                output.push_str(&serde_json::to_string_pretty(&outcome.document)?);
                output.push('\n');
            }
        }
    }

    Ok(output)
}

fn format_rule_problems_human(rule_count: usize, problems: &[RuleFailure]) -> String {
    if problems.is_empty() {
        return format!("✅ All {} rule(s) are valid\n", rule_count);
    }

    let mut output = format!(
        "❌ {} problem(s) in {} rule(s)\n\n",
        problems.len(),
        rule_count
    );
    for problem in problems {
        output.push_str(&format!(
            "  • rule {} ({} -> {}): [{}] {}\n",
            problem.rule_index,
            problem.source_field,
            problem.dest_field,
            problem.error.kind(),
            problem.error
        ));
    }
    output
}

fn format_migration_logs_human(logs: &[MigrationLog]) -> String {
    if logs.is_empty() {
        return "No migration logs were created\n".to_string();
    }

    let headers = ["ID", "DATAFLOW", "STATUS", "SOURCE", "DESTINATION", "DETAIL"];
    let rows: Vec<[String; 6]> = logs
        .iter()
        .map(|log| {
            let detail = log
                .error_message
                .clone()
                .or_else(|| log.execution_handle.clone())
                .unwrap_or_default();
            [
                log.id.to_string(),
                log.dataflow_id.to_string(),
                log.status.to_string(),
                log.source_identifier.clone(),
                log.dest_identifier.clone().unwrap_or_else(|| "-".to_string()),
                detail,
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut output = render(headers.to_vec());
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    output.push('\n');
    for row in &rows {
        output.push_str(&render(row.iter().map(String::as_str).collect()));
        output.push('\n');
    }
    output
}
