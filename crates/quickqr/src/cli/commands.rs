//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::entry::{EntryType, LogKind};
use crate::generate::{QrPayload, WifiEncryption};

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Decoded QR payload as delivered by the scanner
    pub content: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Generate command arguments.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// What to encode
    #[command(subcommand)]
    pub payload: PayloadCommand,

    /// Write the image into the configured output directory
    #[arg(short, long, global = true)]
    pub save: bool,

    /// Write the image into this directory (implies --save)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

/// Payload kinds the generator can encode.
#[derive(Debug, Subcommand)]
pub enum PayloadCommand {
    /// Free text
    Text {
        /// Text to encode
        text: String,
    },

    /// Website address
    Url {
        /// URL; `https://` is assumed when no scheme is given
        url: String,
    },

    /// Phone number
    Phone {
        /// Number to dial
        phone: String,
    },

    /// Email draft
    Email {
        /// Recipient address
        email: String,

        /// Subject line
        #[arg(long)]
        subject: Option<String>,

        /// Message body
        #[arg(long)]
        body: Option<String>,
    },

    /// Wi-Fi network credentials
    Wifi {
        /// Network name (SSID)
        ssid: String,

        /// Network password
        #[arg(short, long, default_value = "")]
        password: String,

        /// Authentication type
        #[arg(short, long, value_enum, default_value = "wpa")]
        encryption: EncryptionArg,
    },
}

impl From<PayloadCommand> for QrPayload {
    fn from(cmd: PayloadCommand) -> Self {
        match cmd {
            PayloadCommand::Text { text } => Self::Text { text },
            PayloadCommand::Url { url } => Self::Url { url },
            PayloadCommand::Phone { phone } => Self::Phone { phone },
            PayloadCommand::Email {
                email,
                subject,
                body,
            } => Self::Email {
                email,
                subject,
                body,
            },
            PayloadCommand::Wifi {
                ssid,
                password,
                encryption,
            } => Self::Wifi {
                ssid,
                password,
                encryption: encryption.into(),
            },
        }
    }
}

/// History management commands.
#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List history entries, newest first
    List {
        /// Show generated codes instead of scans
        #[arg(short, long)]
        generated: bool,

        /// Only show entries of this type
        #[arg(short = 't', long, value_enum)]
        entry_type: Option<EntryTypeArg>,

        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the full content of one entry
    Show {
        /// Entry id
        id: String,

        /// Look in generated codes instead of scans
        #[arg(short, long)]
        generated: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete one entry
    Delete {
        /// Entry id
        id: String,

        /// Delete from generated codes instead of scans
        #[arg(short, long)]
        generated: bool,
    },

    /// Delete every entry in a log
    Clear {
        /// Clear generated codes instead of scans
        #[arg(short, long)]
        generated: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Map the `--generated` flag to a log.
#[must_use]
pub fn log_kind(generated: bool) -> LogKind {
    if generated {
        LogKind::Generated
    } else {
        LogKind::Scanned
    }
}

/// Validate command arguments.
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Which check to run
    #[arg(value_enum)]
    pub kind: ValidateKind,

    /// Value to check
    pub value: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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

/// Validator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValidateKind {
    /// http(s) URL
    Url,
    /// Email address
    Email,
    /// Phone number
    Phone,
}

/// Wi-Fi encryption argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncryptionArg {
    /// WPA/WPA2
    Wpa,
    /// WEP
    Wep,
    /// Open network
    Nopass,
}

impl From<EncryptionArg> for WifiEncryption {
    fn from(arg: EncryptionArg) -> Self {
        match arg {
            EncryptionArg::Wpa => Self::Wpa,
            EncryptionArg::Wep => Self::Wep,
            EncryptionArg::Nopass => Self::NoPass,
        }
    }
}

/// Entry type argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntryTypeArg {
    /// Free text
    Text,
    /// Website links
    Url,
    /// Phone numbers
    Phone,
    /// Email addresses
    Email,
    /// Wi-Fi credentials
    Wifi,
}

impl From<EntryTypeArg> for EntryType {
    fn from(arg: EntryTypeArg) -> Self {
        match arg {
            EntryTypeArg::Text => Self::Text,
            EntryTypeArg::Url => Self::Url,
            EntryTypeArg::Phone => Self::Phone,
            EntryTypeArg::Email => Self::Email,
            EntryTypeArg::Wifi => Self::Wifi,
        }
    }
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
