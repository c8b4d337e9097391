//! Command-line interface for crashlogger.
//!
//! This module provides the CLI structure for the `crashlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ClassifyCommand, ConfigCommand, OutputFormat, ReplayCommand, RunCommand};

/// crashlog - Detect and record vehicle crashes
///
/// Polls an accelerometer, classifies the vehicle's orientation, records
/// each crash with the latest position fix, and serves the crash log.
#[derive(Debug, Parser)]
#[command(name = "crashlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the polling loop in real time against a sensor trace
    Run(RunCommand),

    /// Replay a sensor trace on a virtual clock and print the crash log
    Replay(ReplayCommand),

    /// Classify a single accelerometer sample given in g
    Classify(ClassifyCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
