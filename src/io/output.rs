//! Output management for CLI commands.
//!
//! Handles formatting and display for different output formats,
//! providing a unified interface for text and JSON output.

use crate::error::CaucusError;
use crate::io::exit_code::ExitCode;
use crate::io::format::{JsonResponse, OutputFormat};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};

/// Manages output formatting and display.
pub struct OutputManager {
    format: OutputFormat,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl OutputManager {
    /// Create a new output manager with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Create an output manager with custom writers.
    pub fn new_with_writers(
        format: OutputFormat,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            stdout,
            stderr,
        }
    }

    /// Output a successful result.
    ///
    /// In JSON mode, wraps the data in a success response.
    /// In text mode, displays the data using its Display implementation.
    pub fn success<T>(&mut self, data: T) -> io::Result<ExitCode>
    where
        T: Serialize + Display,
    {
        match self.format {
            OutputFormat::Json => {
                let message = data.to_string();
                let response = JsonResponse::success(&data).with_message(&message);
                writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text => {
                writeln!(self.stdout, "{data}")?;
            }
        }
        Ok(ExitCode::Success)
    }

    /// Output a collection, rendering it with `table` in text mode.
    ///
    /// Empty collections are treated as not found.
    pub fn collection<T, F>(
        &mut self,
        items: &[T],
        entity_name: &str,
        hint: &str,
        table: F,
    ) -> io::Result<ExitCode>
    where
        T: Serialize,
        F: FnOnce(&[T]) -> String,
    {
        if items.is_empty() {
            return self.not_found(entity_name, hint);
        }

        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::success(items)
                    .with_message(&format!("Found {} {entity_name}", items.len()));
                writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text => {
                writeln!(self.stdout, "{}", table(items))?;
            }
        }
        Ok(ExitCode::Success)
    }

    /// Output a not found result.
    pub fn not_found(&mut self, entity: &str, hint: &str) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::not_found(entity, hint);
                writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text => {
                writeln!(self.stderr, "No {entity} available")?;
                writeln!(self.stderr, "  Suggestion: {hint}")?;
            }
        }
        Ok(ExitCode::NotFound)
    }

    /// Output an error with suggestions.
    pub fn error(&mut self, error: &CaucusError) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::from_error(error);
                writeln!(self.stderr, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text => {
                writeln!(self.stderr, "Error: {error}")?;
                for suggestion in error.recovery_suggestions() {
                    writeln!(self.stderr, "  Suggestion: {suggestion}")?;
                }
            }
        }
        Ok(ExitCode::from_error(error))
    }
}
