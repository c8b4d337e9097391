//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Run command arguments.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// JSON-lines sensor trace, one object per polling tick
    pub trace: PathBuf,
}

/// Replay command arguments.
#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// JSON-lines sensor trace, one object per polling tick
    pub trace: PathBuf,

    /// Output format for the crash log
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Classify command arguments.
#[derive(Debug, Args)]
pub struct ClassifyCommand {
    /// X-axis acceleration in g
    #[arg(allow_negative_numbers = true)]
    pub x: f32,

    /// Y-axis acceleration in g
    #[arg(allow_negative_numbers = true)]
    pub y: f32,

    /// Z-axis acceleration in g
    #[arg(allow_negative_numbers = true)]
    pub z: f32,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for the crash log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text table
    #[default]
    Text,
    /// The HTML page served to browsers
    Html,
    /// JSON document
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(
            OutputFormat::from_str("html", true).unwrap(),
            OutputFormat::Html
        );
        assert!(OutputFormat::from_str("table", true).is_err());
    }
}
