//! Record persistence.
//!
//! The pipeline and the bot touch storage only through the [`RecordStore`]
//! trait, so tests run against an in-memory store and deployments can swap
//! the backing without touching extraction or conversation logic.
//!
//! [`JsonStore`] is the bundled implementation: the full record set lives in
//! memory behind a mutex and, when opened on a path, is flushed to a JSON
//! array after every mutation using an atomic write (temp file + rename) so
//! a crash never leaves a half-written store behind.

use crate::error::RelayError;
use crate::record::StoredRecord;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Storage operations required by the ingestion pipeline and the bot.
///
/// Mutations are serialized internally per store; callers never coordinate.
pub trait RecordStore: Send + Sync {
    /// Persist a new record, returning its store-assigned id.
    fn create(&self, record: StoredRecord) -> Result<u64, RelayError>;

    /// All records for a national id, most recent first.
    fn find_by_national_id(&self, national_id: &str) -> Result<Vec<StoredRecord>, RelayError>;

    /// The latest record bound to this chat, if any.
    fn find_by_chat(&self, chat_id: i64) -> Result<Option<StoredRecord>, RelayError>;

    /// Bind every record with this national id to the chat.
    /// Returns the number of records updated (zero is not an error).
    fn bind_chat(&self, national_id: &str, chat_id: i64) -> Result<u64, RelayError>;

    /// Stamp a record's last-retrieval timestamp.
    fn mark_retrieved(&self, id: u64, at: DateTime<Utc>) -> Result<(), RelayError>;
}

struct Inner {
    records: Vec<StoredRecord>,
    next_id: u64,
    /// When set, the store is flushed here after every mutation.
    path: Option<PathBuf>,
}

/// JSON-array record store, in-memory or file-backed.
pub struct JsonStore {
    inner: Mutex<Inner>,
}

impl JsonStore {
    /// A store that lives only in memory. Used by tests and one-shot runs.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                next_id: 1,
                path: None,
            }),
        }
    }

    /// Open a file-backed store, loading any existing records.
    ///
    /// A missing file starts an empty store; it is created on first write.
    /// An unreadable or undecodable file is a fatal startup error.
    pub fn open(path: &Path) -> Result<Self, RelayError> {
        let records: Vec<StoredRecord> = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| RelayError::Store(format!(
                "store file {} is not a valid record array: {e}",
                path.display()
            )))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(RelayError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        info!("opened record store {} ({} records)", path.display(), records.len());

        Ok(Self {
            inner: Mutex::new(Inner {
                records,
                next_id,
                path: Some(path.to_path_buf()),
            }),
        })
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write the record array atomically: temp file in the same directory,
/// then rename over the destination.
fn flush(records: &[StoredRecord], path: &Path) -> Result<(), RelayError> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| RelayError::Store(format!("serialising store: {e}")))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| RelayError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| RelayError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

impl Inner {
    fn flush_if_backed(&self) -> Result<(), RelayError> {
        match &self.path {
            Some(p) => flush(&self.records, p),
            None => Ok(()),
        }
    }
}

impl RecordStore for JsonStore {
    fn create(&self, mut record: StoredRecord) -> Result<u64, RelayError> {
        let mut inner = self.inner.lock().unwrap();
        record.id = inner.next_id;
        inner.next_id += 1;
        let id = record.id;
        inner.records.push(record);
        inner.flush_if_backed()?;
        debug!("stored record {id}");
        Ok(id)
    }

    fn find_by_national_id(&self, national_id: &str) -> Result<Vec<StoredRecord>, RelayError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<StoredRecord> = inner
            .records
            .iter()
            .filter(|r| r.payslip.national_id.as_deref() == Some(national_id))
            .cloned()
            .collect();
        // Most recent first; id breaks ties for records ingested in the same instant.
        matches.sort_by(|a, b| (b.ingested_at, b.id).cmp(&(a.ingested_at, a.id)));
        Ok(matches)
    }

    fn find_by_chat(&self, chat_id: i64) -> Result<Option<StoredRecord>, RelayError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .filter(|r| r.chat_id == Some(chat_id))
            .max_by_key(|r| (r.ingested_at, r.id))
            .cloned())
    }

    fn bind_chat(&self, national_id: &str, chat_id: i64) -> Result<u64, RelayError> {
        let mut inner = self.inner.lock().unwrap();
        let mut updated = 0u64;
        for r in inner
            .records
            .iter_mut()
            .filter(|r| r.payslip.national_id.as_deref() == Some(national_id))
        {
            r.chat_id = Some(chat_id);
            updated += 1;
        }
        if updated > 0 {
            inner.flush_if_backed()?;
        }
        Ok(updated)
    }

    fn mark_retrieved(&self, id: u64, at: DateTime<Utc>) -> Result<(), RelayError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RelayError::Store(format!("no record with id {id}")))?;
        record.last_retrieved = Some(at);
        inner.flush_if_backed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PayslipRecord;
    use chrono::TimeZone;

    fn record(national_id: &str, ingested_at: DateTime<Utc>) -> StoredRecord {
        StoredRecord {
            id: 0,
            payslip: PayslipRecord {
                national_id: Some(national_id.to_string()),
                ..Default::default()
            },
            source_file: PathBuf::from("/in/payslip.pdf"),
            chat_id: None,
            last_retrieved: None,
            ingested_at,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let store = JsonStore::in_memory();
        assert_eq!(store.create(record("1234567890", at(1))).unwrap(), 1);
        assert_eq!(store.create(record("1234567890", at(2))).unwrap(), 2);
    }

    #[test]
    fn find_by_national_id_is_most_recent_first() {
        let store = JsonStore::in_memory();
        store.create(record("1234567890", at(1))).unwrap();
        store.create(record("1234567890", at(3))).unwrap();
        store.create(record("1234567890", at(2))).unwrap();
        store.create(record("0000000000", at(9))).unwrap();

        let found = store.find_by_national_id("1234567890").unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].ingested_at, at(3));
        assert_eq!(found[2].ingested_at, at(1));
    }

    #[test]
    fn bind_chat_updates_all_matching_records() {
        let store = JsonStore::in_memory();
        store.create(record("1234567890", at(1))).unwrap();
        store.create(record("1234567890", at(2))).unwrap();
        store.create(record("0000000000", at(3))).unwrap();

        assert_eq!(store.bind_chat("1234567890", 42).unwrap(), 2);
        assert_eq!(store.bind_chat("no-such-id", 42).unwrap(), 0);

        let bound = store.find_by_chat(42).unwrap().unwrap();
        assert_eq!(bound.ingested_at, at(2), "latest bound record");
        assert!(store.find_by_chat(7).unwrap().is_none());
    }

    #[test]
    fn mark_retrieved_stamps_the_record() {
        let store = JsonStore::in_memory();
        let id = store.create(record("1234567890", at(1))).unwrap();
        store.bind_chat("1234567890", 42).unwrap();
        store.mark_retrieved(id, at(5)).unwrap();
        let bound = store.find_by_chat(42).unwrap().unwrap();
        assert_eq!(bound.last_retrieved, Some(at(5)));
    }

    #[test]
    fn mark_retrieved_unknown_id_fails() {
        let store = JsonStore::in_memory();
        assert!(store.mark_retrieved(99, at(1)).is_err());
    }

    #[test]
    fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        {
            let store = JsonStore::open(&path).unwrap();
            store.create(record("1234567890", at(1))).unwrap();
            store.bind_chat("1234567890", 42).unwrap();
        }

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        let bound = reopened.find_by_chat(42).unwrap().unwrap();
        assert_eq!(bound.payslip.national_id.as_deref(), Some("1234567890"));
        // Ids continue past the highest persisted one.
        assert_eq!(reopened.create(record("1234567890", at(2))).unwrap(), 2);
    }

    #[test]
    fn corrupt_store_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonStore::open(&path).is_err());
    }
}
