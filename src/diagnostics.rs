//! Batched error reporting.
//!
//! The typer records every problem it finds into a [`Diagnostics`] collector
//! and keeps going. Once the whole program has been typed the collector is
//! flushed: up to [`Config::max_errors`] errors are rendered with one line of
//! source context on either side, and a single [`CheckFailure`] is returned
//! if there was at least one error. Warnings are rendered the same way but
//! never fail the run.

use colored::*;
use log::debug;
use thiserror::Error;

use crate::ast::Span;
use crate::types::TypeError;

pub const DEFAULT_MAX_ERRORS: usize = 10;

/// Reporting options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many errors to render before summarizing the rest.
    pub max_errors: usize,
    /// Highlight spans with ANSI colors.
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            color: true,
        }
    }
}

impl Config {
    pub fn plain() -> Self {
        Self {
            color: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub span: Span,
}

/// Aggregated failure of a checking phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type checking failed with {count} error(s)\n{report}")]
pub struct CheckFailure {
    pub count: usize,
    pub errors: Vec<TypeError>,
    pub report: String,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<TypeError>,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: TypeError) {
        debug!("recorded error: {}", error);
        self.errors.push(error);
    }

    pub fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.warnings.push(Warning {
            message: message.into(),
            span,
        });
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Render errors (capped) followed by all warnings.
    pub fn render(&self, source: &str, config: &Config) -> String {
        let printer = Printer::new(source, config.color);
        let mut out = String::new();

        for error in self.errors.iter().take(config.max_errors) {
            printer.entry(&mut out, Severity::Error, &error.to_string(), error.span());
        }

        let omitted = self.errors.len().saturating_sub(config.max_errors);
        if omitted > 0 {
            let note = format!("... and {} more error(s) omitted", omitted);
            out.push_str(&printer.paint_note(&note));
            out.push('\n');
        }

        for warning in &self.warnings {
            printer.entry(&mut out, Severity::Warning, &warning.message, warning.span);
        }

        out
    }

    /// Finish the phase: `Err` with the rendered report if anything failed,
    /// otherwise the warnings that were collected.
    pub fn finish(self, source: &str, config: &Config) -> Result<Vec<Warning>, CheckFailure> {
        if self.errors.is_empty() {
            return Ok(self.warnings);
        }

        let report = self.render(source, config);
        Err(CheckFailure {
            count: self.errors.len(),
            errors: self.errors,
            report,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
}

struct Printer<'a> {
    lines: Vec<&'a str>,
    color: bool,
}

impl<'a> Printer<'a> {
    fn new(source: &'a str, color: bool) -> Self {
        Self {
            lines: source.lines().collect(),
            color,
        }
    }

    fn entry(&self, out: &mut String, severity: Severity, message: &str, span: Span) {
        let label = match (severity, self.color) {
            (Severity::Error, true) => "error".bold().bright_red().to_string(),
            (Severity::Warning, true) => "warning".bold().yellow().to_string(),
            (Severity::Error, false) => "error".to_string(),
            (Severity::Warning, false) => "warning".to_string(),
        };
        out.push_str(&format!("{}: {}\n", label, message));

        if span.is_unknown() || span.start.line > self.lines.len() {
            return;
        }

        let arrow = if self.color {
            "-->".blue().bold().to_string()
        } else {
            "-->".to_string()
        };
        out.push_str(&format!(
            "  {} {}:{}\n",
            arrow, span.start.line, span.start.column
        ));

        let first = span.start.line.saturating_sub(1).max(1);
        let last = (span.end.line.max(span.start.line) + 1).min(self.lines.len());
        let pad = last.to_string().len();

        for line_no in first..=last {
            let text = self.lines[line_no - 1];
            let highlight = columns_in_span(text, line_no, span);
            let gutter = format!("{:>pad$} |", line_no, pad = pad);
            let gutter = if self.color {
                gutter.blue().bold().to_string()
            } else {
                gutter
            };

            match highlight {
                Some((from, to)) if self.color => {
                    let (before, rest) = split_chars(text, from);
                    let (marked, after) = split_chars(rest, to - from);
                    out.push_str(&format!(
                        "{} {}{}{}\n",
                        gutter,
                        before,
                        marked.bold().bright_red().underline(),
                        after
                    ));
                }
                Some((from, to)) => {
                    out.push_str(&format!("{} {}\n", gutter, text));
                    out.push_str(&format!(
                        "{:>pad$} | {}{}\n",
                        "",
                        " ".repeat(from),
                        "^".repeat(to - from),
                        pad = pad
                    ));
                }
                None => out.push_str(&format!("{} {}\n", gutter, text)),
            }
        }
    }

    fn paint_note(&self, note: &str) -> String {
        if self.color {
            note.yellow().bold().to_string()
        } else {
            note.to_string()
        }
    }
}

/// 0-based char range of `line_no` covered by `span`, at least one char wide.
fn columns_in_span(text: &str, line_no: usize, span: Span) -> Option<(usize, usize)> {
    let end_line = span.end.line.max(span.start.line);
    if line_no < span.start.line || line_no > end_line {
        return None;
    }

    let width = text.chars().count();
    let from = if line_no == span.start.line {
        span.start.column.saturating_sub(1)
    } else {
        0
    };
    let to = if line_no == end_line && span.end.line >= span.start.line {
        span.end.column.saturating_sub(1)
    } else {
        width
    };

    let from = from.min(width);
    let to = to.min(width).max(from + 1);
    Some((from, to))
}

fn split_chars(text: &str, at: usize) -> (&str, &str) {
    match text.char_indices().nth(at) {
        Some((index, _)) => text.split_at(index),
        None => (text, ""),
    }
}
