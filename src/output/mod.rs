//! Output rendering for analysis results.
//!
//! Any serializable result renders as JSON, Markdown or plain text through
//! its `serde_json::Value` form. Full project reports get a dedicated
//! overview in Markdown and text.

use std::io::Write;

use colored::{ColoredString, Colorize};
use serde::Serialize;
use serde_json::Value;

use crate::analyzers::Severity;
use crate::config::OutputFormat;
use crate::core::Result;
use crate::score::{ProjectReport, ScoreComponents};

/// Writes results in one output format.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
    color: bool,
}

impl Renderer {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render<T: Serialize, W: Write>(&self, data: &T, writer: &mut W) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.render_value(&value, writer)
    }

    pub fn render_value<W: Write>(&self, value: &Value, writer: &mut W) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)?;
                writeln!(writer)?;
            }
            OutputFormat::Markdown => markdown_value(value, writer, 0)?,
            OutputFormat::Text => text_value(value, writer, 0)?,
        }
        Ok(())
    }

    /// Render a full project report.
    pub fn render_report<W: Write>(&self, report: &ProjectReport, writer: &mut W) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.render(report, writer),
            OutputFormat::Markdown => self.markdown_report(report, writer),
            OutputFormat::Text => self.text_report(report, writer),
        }
    }

    fn markdown_report<W: Write>(&self, report: &ProjectReport, writer: &mut W) -> Result<()> {
        let m = &report.metrics;
        writeln!(writer, "# Code Metrics Report\n")?;
        writeln!(writer, "**Project**: {}\n", m.root.display())?;
        writeln!(writer, "| Metric | Value |")?;
        writeln!(writer, "| --- | --- |")?;
        writeln!(writer, "| Overall Score | {:.1} |", m.overall_score)?;
        writeln!(writer, "| Grade | {} |", m.grade)?;
        writeln!(writer, "| Files Analyzed | {} |", m.total_files)?;
        writeln!(writer, "| Files Skipped | {} |", m.files_skipped)?;
        writeln!(writer, "| Lines | {} |", m.total_lines)?;
        writeln!(writer, "| Issues | {} |\n", report.summary.issues_found)?;

        writeln!(writer, "## Component Scores\n")?;
        writeln!(writer, "| Component | Score |")?;
        writeln!(writer, "| --- | --- |")?;
        for (name, score) in component_rows(&m.components) {
            writeln!(writer, "| {} | {:.1} |", name, score)?;
        }
        writeln!(writer)?;

        writeln!(writer, "## Recommendations\n")?;
        if report.recommendations.is_empty() {
            writeln!(writer, "_No items_\n")?;
        }
        for rec in &report.recommendations {
            writeln!(
                writer,
                "- **[{}]** {}: {}\n  - {}",
                rec.priority.as_str().to_uppercase(),
                rec.category,
                rec.description,
                rec.suggestion
            )?;
        }
        if !report.recommendations.is_empty() {
            writeln!(writer)?;
        }

        if !report.errors.is_empty() {
            writeln!(writer, "## Analyzer Errors\n")?;
            markdown_value(&serde_json::to_value(&report.errors)?, writer, 1)?;
        }

        writeln!(writer, "## Details\n")?;
        let details = serde_json::json!({
            "complexity": m.complexity,
            "quality": m.quality,
            "security": m.security,
            "performance": m.performance,
            "patterns": m.patterns,
            "dependencies": m.dependency,
        });
        markdown_value(&details, writer, 2)
    }

    fn text_report<W: Write>(&self, report: &ProjectReport, writer: &mut W) -> Result<()> {
        let m = &report.metrics;
        writeln!(writer, "{}", self.paint(format!("Code Metrics: {}", m.root.display()).bold()))?;
        writeln!(
            writer,
            "Overall Score: {} (Grade {})",
            self.paint(score_color(format!("{:.1}", m.overall_score).normal(), m.overall_score)),
            self.paint(score_color(m.grade.as_str().bold(), m.overall_score))
        )?;
        writeln!(
            writer,
            "Files: {} analyzed, {} skipped, {} lines, {} issues",
            m.total_files, m.files_skipped, m.total_lines, report.summary.issues_found
        )?;
        writeln!(writer)?;

        writeln!(writer, "{}", self.paint("Components".bold()))?;
        for (name, score) in component_rows(&m.components) {
            writeln!(writer, "  {:<16} {}", name, self.paint(score_color(format!("{score:>5.1}").normal(), score)))?;
        }
        writeln!(writer)?;

        writeln!(writer, "{}", self.paint("Recommendations".bold()))?;
        if report.recommendations.is_empty() {
            writeln!(writer, "  none")?;
        }
        for rec in &report.recommendations {
            let tag = format!("[{}]", rec.priority.as_str().to_uppercase());
            writeln!(
                writer,
                "  {} {}: {}",
                self.paint(priority_color(tag.normal(), rec.priority)),
                rec.category,
                rec.description
            )?;
            writeln!(writer, "      {}", rec.suggestion)?;
        }

        if !report.errors.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.paint("Analyzer Errors".bold()))?;
            for err in &report.errors {
                writeln!(writer, "  {} on {}: {}", err.analyzer, err.file, err.error)?;
            }
        }
        Ok(())
    }

    fn paint(&self, s: ColoredString) -> String {
        if self.color {
            s.to_string()
        } else {
            s.clear().to_string()
        }
    }
}

fn component_rows(c: &ScoreComponents) -> [(&'static str, f64); 6] {
    [
        ("Maintainability", c.maintainability),
        ("Quality", c.quality),
        ("Security", c.security),
        ("Performance", c.performance),
        ("Dependencies", c.dependency),
        ("Patterns", c.patterns),
    ]
}

fn score_color(s: ColoredString, score: f64) -> ColoredString {
    if score >= 80.0 {
        s.green()
    } else if score >= 60.0 {
        s.yellow()
    } else {
        s.red()
    }
}

fn priority_color(s: ColoredString, priority: Severity) -> ColoredString {
    match priority {
        Severity::Critical => s.red().bold(),
        Severity::High => s.red(),
        Severity::Medium => s.yellow(),
        Severity::Low => s.blue(),
    }
}

fn markdown_value<W: Write>(value: &Value, writer: &mut W, depth: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            let header = "#".repeat((depth + 1).min(6));
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{} {}\n", header, format_key(key))?;
                        markdown_value(val, writer, depth + 1)?;
                    }
                    _ => writeln!(writer, "**{}**: {}\n", format_key(key), format_scalar(val))?,
                }
            }
        }
        Value::Array(items) if items.is_empty() => writeln!(writer, "_No items_\n")?,
        Value::Array(items) if is_flat_table(items) => markdown_table(items, writer)?,
        Value::Array(items) if items.iter().all(is_scalar) => {
            for item in items {
                writeln!(writer, "- {}", format_scalar(item))?;
            }
            writeln!(writer)?;
        }
        Value::Array(items) => {
            for item in items {
                writeln!(writer, "---\n")?;
                markdown_value(item, writer, depth)?;
            }
        }
        _ => writeln!(writer, "{}\n", format_scalar(value))?,
    }
    Ok(())
}

fn markdown_table<W: Write>(rows: &[Value], writer: &mut W) -> Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    write!(writer, "|")?;
    for header in &headers {
        write!(writer, " {} |", format_key(header))?;
    }
    writeln!(writer)?;
    write!(writer, "|")?;
    for _ in &headers {
        write!(writer, " --- |")?;
    }
    writeln!(writer)?;

    for row in rows {
        if let Value::Object(map) = row {
            write!(writer, "|")?;
            for header in &headers {
                let cell = map.get(*header).unwrap_or(&Value::Null);
                write!(writer, " {} |", format_scalar(cell).replace('|', "\\|"))?;
            }
            writeln!(writer)?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

fn text_value<W: Write>(value: &Value, writer: &mut W, indent: usize) -> Result<()> {
    let prefix = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{}{}:", prefix, format_key(key))?;
                        text_value(val, writer, indent + 1)?;
                    }
                    _ => writeln!(writer, "{}{}: {}", prefix, format_key(key), format_scalar(val))?,
                }
            }
        }
        Value::Array(items) if items.iter().all(is_scalar) => {
            for item in items {
                writeln!(writer, "{}- {}", prefix, format_scalar(item))?;
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                writeln!(writer, "{}[{}]", prefix, i)?;
                text_value(item, writer, indent + 1)?;
            }
        }
        _ => writeln!(writer, "{}{}", prefix, format_scalar(value))?,
    }
    Ok(())
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn is_flat_table(items: &[Value]) -> bool {
    items
        .iter()
        .all(|v| matches!(v, Value::Object(map) if map.values().all(is_scalar)))
}

fn format_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() != 0.0 => format!("{:.2}", f),
            Some(f) if n.is_f64() => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
        Value::Null => "-".to_string(),
        _ => value.to_string(),
    }
}
