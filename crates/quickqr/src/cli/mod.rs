//! Command-line interface for quickqr.
//!
//! This module provides the CLI structure for the `quickqr` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    log_kind, ConfigCommand, EncryptionArg, EntryTypeArg, GenerateCommand, HistoryCommand,
    OutputFormat, PayloadCommand, ScanCommand, StatusCommand, ValidateCommand, ValidateKind,
};

/// quickqr - Scan and generate QR codes
///
/// Records every scanned and generated code in a local, size-limited history
/// with all markup stripped from stored content.
#[derive(Debug, Parser)]
#[command(name = "quickqr")]
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
    /// Record a decoded QR payload
    Scan(ScanCommand),

    /// Generate a QR code and record it
    Generate(GenerateCommand),

    /// Browse or edit history
    #[command(subcommand)]
    History(HistoryCommand),

    /// Check a URL, email address or phone number
    Validate(ValidateCommand),

    /// Show history and storage status
    Status(StatusCommand),

    /// View configuration
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
