//! The history store: owner of the scanned and generated logs.
//!
//! [`HistoryStore`] is the only way entries get into a log, and every path in
//! goes through [`NewEntry::into_entry`], which sanitizes. After each mutation
//! the affected log, and only that log, is written back to the backend.
//! The store is a plain owned value; hand out references to whatever needs it.

use tracing::{debug, warn};

use crate::classify::prepare_scan;
use crate::config::StorageConfig;
use crate::encode::{EncodeOptions, QrEncoder};
use crate::entry::{HistoryEntry, LogKind, NewEntry};
use crate::error::Result;
use crate::generate::QrPayload;
use crate::log::{HistoryLog, LoadOutcome, PersistOutcome};
use crate::storage::KeyValueStore;

/// Scanned and generated history over a durable backend.
#[derive(Debug)]
pub struct HistoryStore<S: KeyValueStore> {
    backend: S,
    max_persist_bytes: usize,
    scanned: HistoryLog,
    generated: HistoryLog,
    scanned_load: LoadOutcome,
    generated_load: LoadOutcome,
    scanned_persist: Option<PersistOutcome>,
    generated_persist: Option<PersistOutcome>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Load both logs from `backend`.
    ///
    /// Never fails: a missing, unreadable or corrupt record starts that log
    /// empty and is logged as a warning. See [`HistoryStore::load_outcome`].
    #[must_use]
    pub fn open(backend: S, config: &StorageConfig) -> Self {
        let (scanned, scanned_load) =
            HistoryLog::load(&backend, LogKind::Scanned, config.max_entries);
        let (generated, generated_load) =
            HistoryLog::load(&backend, LogKind::Generated, config.max_entries);

        debug!(
            scanned = scanned.len(),
            generated = generated.len(),
            "History loaded"
        );

        Self {
            backend,
            max_persist_bytes: config.max_persist_bytes,
            scanned,
            generated,
            scanned_load,
            generated_load,
            scanned_persist: None,
            generated_persist: None,
        }
    }

    /// The durable backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Scanned history, newest-first.
    #[must_use]
    pub fn scanned(&self) -> &HistoryLog {
        &self.scanned
    }

    /// Generated history, newest-first.
    #[must_use]
    pub fn generated(&self) -> &HistoryLog {
        &self.generated
    }

    /// Either log.
    #[must_use]
    pub fn log(&self, kind: LogKind) -> &HistoryLog {
        match kind {
            LogKind::Scanned => &self.scanned,
            LogKind::Generated => &self.generated,
        }
    }

    /// How a log fared when the store was opened.
    #[must_use]
    pub fn load_outcome(&self, kind: LogKind) -> &LoadOutcome {
        match kind {
            LogKind::Scanned => &self.scanned_load,
            LogKind::Generated => &self.generated_load,
        }
    }

    /// Result of the most recent write of a log, if it has been written
    /// since the store was opened.
    #[must_use]
    pub fn last_persist(&self, kind: LogKind) -> Option<&PersistOutcome> {
        match kind {
            LogKind::Scanned => self.scanned_persist.as_ref(),
            LogKind::Generated => self.generated_persist.as_ref(),
        }
    }

    /// Add an entry to `kind` and persist that log.
    pub fn add(&mut self, kind: LogKind, item: NewEntry) -> HistoryEntry {
        let entry = self.log_mut(kind).add(item);
        self.persist(kind);
        entry
    }

    /// Delete `id` from `kind` and persist that log. Returns false, and
    /// changes nothing, if no entry has that id.
    pub fn delete(&mut self, kind: LogKind, id: &str) -> bool {
        let removed = self.log_mut(kind).delete(id);
        if removed {
            self.persist(kind);
        }
        removed
    }

    /// Empty `kind` and persist that log. Returns how many entries were removed.
    pub fn clear(&mut self, kind: LogKind) -> usize {
        let removed = self.log_mut(kind).clear();
        self.persist(kind);
        removed
    }

    /// Add to the scanned log.
    pub fn add_scanned(&mut self, item: NewEntry) -> HistoryEntry {
        self.add(LogKind::Scanned, item)
    }

    /// Add to the generated log.
    pub fn add_generated(&mut self, item: NewEntry) -> HistoryEntry {
        self.add(LogKind::Generated, item)
    }

    /// Delete from the scanned log.
    pub fn delete_scanned(&mut self, id: &str) -> bool {
        self.delete(LogKind::Scanned, id)
    }

    /// Delete from the generated log.
    pub fn delete_generated(&mut self, id: &str) -> bool {
        self.delete(LogKind::Generated, id)
    }

    /// Empty the scanned log.
    pub fn clear_scanned(&mut self) -> usize {
        self.clear(LogKind::Scanned)
    }

    /// Empty the generated log.
    pub fn clear_generated(&mut self) -> usize {
        self.clear(LogKind::Generated)
    }

    /// Record one decoded scan: sanitize, classify, check, insert.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidScan`] if the payload is rejected; no
    /// entry is created.
    pub fn record_scan(&mut self, decoded: &str) -> Result<HistoryEntry> {
        let scan = prepare_scan(decoded)?;
        Ok(self.add_scanned(scan.into_new_entry()))
    }

    /// Validate a generator payload, render it, and insert it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for bad form input and
    /// [`crate::Error::Encode`] if rendering fails. No entry is created in
    /// either case.
    pub fn record_generated(
        &mut self,
        payload: &QrPayload,
        encoder: &dyn QrEncoder,
        options: &EncodeOptions,
    ) -> Result<HistoryEntry> {
        payload.validate()?;
        let content = payload.content();
        let qr_code = encoder.encode(&content, options)?;
        Ok(self.add_generated(payload.to_new_entry(content, qr_code)))
    }

    fn log_mut(&mut self, kind: LogKind) -> &mut HistoryLog {
        match kind {
            LogKind::Scanned => &mut self.scanned,
            LogKind::Generated => &mut self.generated,
        }
    }

    fn persist(&mut self, kind: LogKind) {
        let outcome = self.log(kind).persist(&self.backend, self.max_persist_bytes);
        if !outcome.is_success() {
            warn!(log = %kind, %outcome, "History kept in memory only");
        }
        match kind {
            LogKind::Scanned => self.scanned_persist = Some(outcome),
            LogKind::Generated => self.generated_persist = Some(outcome),
        }
    }
}
