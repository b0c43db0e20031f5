//! `quickqr` - scan and generate QR codes with a sanitized local history.
//!
//! Decoded scans and generator input flow through the same pipeline:
//! validate, strip markup, insert into a bounded newest-first log, write the
//! log to local storage. Decoding and rendering themselves are delegated.
//!
//! ```no_run
//! use quickqr::{HistoryStore, SqliteStore, StorageConfig};
//!
//! let backend = SqliteStore::open("history.db")?;
//! let mut history = HistoryStore::open(backend, &StorageConfig::default());
//! let entry = history.record_scan("https://example.com")?;
//! assert_eq!(entry.title, "example.com");
//! # Ok::<(), quickqr::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod classify;
pub mod cli;
pub mod config;
pub mod encode;
pub mod entry;
pub mod error;
pub mod generate;
pub mod history;
pub mod log;
pub mod logging;
pub mod sanitize;
pub mod storage;
pub mod validate;

pub use classify::{classify, derive_title, prepare_scan, ScanResult};
pub use config::{Config, GeneratorConfig, StorageConfig};
pub use encode::{EncodeOptions, QrEncoder, SvgQrEncoder};
pub use entry::{EntryType, HistoryEntry, LogKind, NewEntry};
pub use error::{Error, Result};
pub use generate::{QrPayload, WifiEncryption};
pub use history::HistoryStore;
pub use log::{BoundedLog, HistoryLog, LoadOutcome, PersistOutcome};
pub use logging::init_logging;
pub use sanitize::sanitize;
pub use storage::{KeyValueStore, SqliteStore, StoreStats};
pub use validate::{is_valid_email, is_valid_phone, is_valid_url};
