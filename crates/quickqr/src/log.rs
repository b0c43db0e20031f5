//! Bounded, persisted history logs.
//!
//! A [`HistoryLog`] is an ordered, newest-first sequence of [`HistoryEntry`]
//! records capped at a fixed capacity. Inserting past capacity evicts the
//! oldest entries. The whole sequence is written to a [`KeyValueStore`] as one
//! JSON array under the log's storage key.
//!
//! Load and persist never fail outright. They return a [`LoadOutcome`] or
//! [`PersistOutcome`] so callers can decide whether to log or ignore; a
//! corrupt record loads as an empty log and an oversized one is simply not
//! written.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace, warn};

use crate::entry::{HistoryEntry, LogKind, NewEntry};
use crate::storage::KeyValueStore;

/// Entries kept per log unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 50;

/// A capacity-limited deque that keeps the newest item at the front.
///
/// Eviction is oldest-first: pushing onto a full log drops items from the back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    /// Create an empty log. A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a log from items ordered newest-first, dropping any beyond capacity.
    #[must_use]
    pub fn from_newest_first(items: impl IntoIterator<Item = T>, capacity: usize) -> Self {
        let mut log = Self::with_capacity(capacity);
        log.items.extend(items.into_iter().take(log.capacity));
        log
    }

    /// Insert `item` as the newest and return whatever fell off the end.
    pub fn push_front(&mut self, item: T) -> Vec<T> {
        self.items.push_front(item);
        if self.items.len() > self.capacity {
            self.items.split_off(self.capacity).into_iter().collect()
        } else {
            Vec::new()
        }
    }

    /// Remove every item matching `pred`, returning how many were removed.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !pred(item));
        before - self.items.len()
    }

    /// Remove everything, returning how many items there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    /// Newest item, if any.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Number of items held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the log holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of items held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// What happened when a log was read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A record was found and parsed.
    Loaded {
        /// Entries kept after capacity truncation.
        count: usize,
    },
    /// No record exists yet.
    Absent,
    /// A record exists but isn't a valid entry list.
    Corrupt {
        /// Parser message.
        reason: String,
    },
    /// The store itself could not be read.
    Unreadable {
        /// Storage error message.
        reason: String,
    },
}

impl LoadOutcome {
    /// True for `Loaded` and `Absent`, the outcomes that lose nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::Absent)
    }
}

/// What happened when a log was written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The record was replaced.
    Written {
        /// Serialized size.
        bytes: usize,
    },
    /// The serialized record exceeded the ceiling; the stored copy is unchanged.
    TooLarge {
        /// Serialized size.
        bytes: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// Serialization or the storage write failed; the stored copy is unchanged.
    Failed {
        /// Error message.
        reason: String,
    },
}

impl PersistOutcome {
    /// Whether the durable copy now matches memory.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

impl std::fmt::Display for PersistOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Written { bytes } => write!(f, "written ({bytes} bytes)"),
            Self::TooLarge { bytes, limit } => {
                write!(f, "not written: {bytes} bytes exceeds limit of {limit}")
            }
            Self::Failed { reason } => write!(f, "not written: {reason}"),
        }
    }
}

/// One of the two history logs, bound to its storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLog {
    kind: LogKind,
    entries: BoundedLog<HistoryEntry>,
}

impl HistoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new(kind: LogKind, capacity: usize) -> Self {
        Self {
            kind,
            entries: BoundedLog::with_capacity(capacity),
        }
    }

    /// Which log this is.
    #[must_use]
    pub fn kind(&self) -> LogKind {
        self.kind
    }

    /// Sanitize `item` into a new entry stamped with the current time and
    /// insert it as the newest.
    pub fn add(&mut self, item: NewEntry) -> HistoryEntry {
        self.add_at(item, Utc::now())
    }

    /// Like [`HistoryLog::add`] with an explicit creation time.
    ///
    /// Creation times within a log strictly increase at millisecond
    /// resolution, so when `now` is not later than the newest entry it is
    /// bumped one millisecond past it. This keeps ids unique and the log
    /// ordered even for bursts within one millisecond or a clock step back.
    pub fn add_at(&mut self, item: NewEntry, now: DateTime<Utc>) -> HistoryEntry {
        let created_at = match self.entries.front() {
            Some(newest) if now.timestamp_millis() <= newest.timestamp.timestamp_millis() => {
                newest.timestamp + Duration::milliseconds(1)
            }
            _ => now,
        };

        let entry = item.into_entry(self.kind, created_at);
        debug!(log = %self.kind, id = %entry.id, entry_type = %entry.entry_type, "Adding entry");

        for evicted in self.entries.push_front(entry.clone()) {
            trace!(log = %self.kind, id = %evicted.id, "Evicted oldest entry");
        }

        entry
    }

    /// Remove the entry with `id`. Returns false if there was none.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.entries.remove_where(|entry| entry.id == id);
        debug!(log = %self.kind, id, removed, "Deleted entry");
        removed > 0
    }

    /// Remove all entries, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.clear();
        debug!(log = %self.kind, removed, "Cleared log");
        removed
    }

    /// Find an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Entries, newest-first, as an owned list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Read the log for `kind` from `store`.
    ///
    /// Any failure yields an empty log; the outcome says why.
    #[must_use]
    pub fn load(store: &dyn KeyValueStore, kind: LogKind, capacity: usize) -> (Self, LoadOutcome) {
        let key = kind.storage_key();

        let raw = match store.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return (Self::new(kind, capacity), LoadOutcome::Absent),
            Err(e) => {
                warn!(key, error = %e, "Could not read history, starting empty");
                return (
                    Self::new(kind, capacity),
                    LoadOutcome::Unreadable {
                        reason: e.to_string(),
                    },
                );
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(entries) => {
                let stored = entries.len();
                let log = Self {
                    kind,
                    entries: BoundedLog::from_newest_first(entries, capacity),
                };
                if stored > log.len() {
                    debug!(key, stored, kept = log.len(), "Truncated history to capacity");
                }
                let count = log.len();
                (log, LoadOutcome::Loaded { count })
            }
            Err(e) => {
                warn!(key, error = %e, "Stored history is corrupt, starting empty");
                (
                    Self::new(kind, capacity),
                    LoadOutcome::Corrupt {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// Write the whole log to `store`, unless it serializes to more than
    /// `limit` bytes.
    ///
    /// On failure the previously stored record is left as it was and memory
    /// is not rolled back.
    #[must_use]
    pub fn persist(&self, store: &dyn KeyValueStore, limit: usize) -> PersistOutcome {
        let key = self.kind.storage_key();

        let json = match serde_json::to_string(&self.to_vec()) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Could not serialize history");
                return PersistOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let bytes = json.len();
        if bytes > limit {
            warn!(key, bytes, limit, "History exceeds size limit, not persisted");
            return PersistOutcome::TooLarge { bytes, limit };
        }

        match store.set(key, &json) {
            Ok(()) => {
                trace!(key, bytes, "Persisted history");
                PersistOutcome::Written { bytes }
            }
            Err(e) => {
                warn!(key, error = %e, "Storage write failed");
                PersistOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
