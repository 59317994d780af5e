//! Output formatting for CLI commands

use serde::Serialize;

use crate::storage;
use crate::validator::Diagnostic;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<storage::OutputFormat> for OutputFormat {
    fn from(format: storage::OutputFormat) -> Self {
        match format {
            storage::OutputFormat::Text => OutputFormat::Text,
            storage::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints a validation result and returns true if it is valid
    pub fn outcome(&self, diagnostic: Option<&Diagnostic>) -> bool {
        match (self.format, diagnostic) {
            (OutputFormat::Text, None) => println!("OK"),
            (OutputFormat::Text, Some(diagnostic)) => println!("{}", diagnostic),
            (OutputFormat::Json, None) => println!("{}", serde_json::json!({ "valid": true })),
            (OutputFormat::Json, Some(diagnostic)) => println!(
                "{}",
                serde_json::json!({
                    "valid": false,
                    "diagnostic": diagnostic,
                })
            ),
        }
        diagnostic.is_none()
    }

    /// Prints a table row (text only, ignored in JSON mode)
    pub fn row(&self, columns: &[&str]) {
        if self.format == OutputFormat::Text {
            println!("{}", columns.join("\t"));
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
