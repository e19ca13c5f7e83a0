//! The ingestion pipeline: PDF files in, stored records (and push
//! notifications) out.
//!
//! Ingestion is batch-oriented and forgiving: a directory scan processes
//! every `*.pdf` it finds in name order, and a file that cannot be read is
//! logged and skipped rather than aborting the batch — payroll exports
//! routinely contain one broken file among hundreds of good ones. Storage
//! failures, by contrast, abort: losing records silently is worse than
//! stopping.
//!
//! When a record's identity is already bound to a chat (the recipient
//! registered earlier), the new record inherits the binding and is pushed
//! to that chat immediately. A failed push never fails the ingestion; the
//! record is stored either way and stays retrievable on request.

use crate::error::RelayError;
use crate::extract::engine::extract;
use crate::extract::normalize::normalize_lines;
use crate::notify;
use crate::record::StoredRecord;
use crate::source::DocumentSource;
use crate::store::RecordStore;
use crate::transport::Transport;
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};

/// Counters from one directory scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    /// PDF files found.
    pub scanned: usize,
    /// Records stored.
    pub ingested: usize,
    /// Files skipped as unreadable.
    pub skipped: usize,
    /// Records pushed to an already-bound chat.
    pub notified: usize,
}

/// Result of ingesting a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestedFile {
    /// Store-assigned record id.
    pub id: u64,
    /// Whether the record was pushed to a bound chat.
    pub notified: bool,
}

/// Ingest every `*.pdf` in a directory, in file-name order.
///
/// Pass `None` for the transport to ingest without push notifications
/// (e.g. an initial backfill before the bot goes live).
pub async fn ingest_dir<D, S, T>(
    dir: &Path,
    source: &D,
    store: &S,
    transport: Option<&T>,
) -> Result<IngestReport, RelayError>
where
    D: DocumentSource,
    S: RecordStore,
    T: Transport,
{
    let mut paths = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| RelayError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| RelayError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = IngestReport {
        scanned: paths.len(),
        ..Default::default()
    };
    for path in &paths {
        match ingest_file(path, source, store, transport).await {
            Ok(outcome) => {
                report.ingested += 1;
                if outcome.notified {
                    report.notified += 1;
                }
            }
            Err(RelayError::DocumentUnreadable { path, detail }) => {
                warn!("skipping unreadable document {}: {detail}", path.display());
                report.skipped += 1;
            }
            Err(other) => return Err(other),
        }
    }
    info!(
        scanned = report.scanned,
        ingested = report.ingested,
        skipped = report.skipped,
        notified = report.notified,
        "directory ingestion finished"
    );
    Ok(report)
}

/// Ingest one document: read, extract, persist, and push if a chat is
/// already bound to the extracted identity.
pub async fn ingest_file<D, S, T>(
    path: &Path,
    source: &D,
    store: &S,
    transport: Option<&T>,
) -> Result<IngestedFile, RelayError>
where
    D: DocumentSource,
    S: RecordStore,
    T: Transport,
{
    let text = source.open_text(path)?;
    let payslip = extract(&normalize_lines(&text));
    if payslip.is_empty() {
        warn!("no fields extracted from {}", path.display());
    }

    // Inherit the chat binding from earlier records of the same identity.
    let chat_id = match payslip.national_id.as_deref() {
        Some(nid) => store
            .find_by_national_id(nid)?
            .into_iter()
            .find_map(|r| r.chat_id),
        None => None,
    };

    let mut record = StoredRecord {
        id: 0,
        payslip,
        source_file: path.to_path_buf(),
        chat_id,
        last_retrieved: None,
        ingested_at: Utc::now(),
    };
    record.id = store.create(record.clone())?;
    debug!(record = record.id, "ingested {}", path.display());

    let mut notified = false;
    if let (Some(transport), Some(chat)) = (transport, chat_id) {
        match notify::dispatch(transport, chat, &record).await {
            Ok(()) => notified = true,
            Err(e) => warn!(
                chat_id = chat,
                record = record.id,
                "push notification failed: {e}"
            ),
        }
    }

    Ok(IngestedFile {
        id: record.id,
        notified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;
    use crate::transport::{Inbound, Transport};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Maps file names to fixture text; anything else is unreadable.
    struct FixtureSource {
        texts: HashMap<String, String>,
    }

    impl FixtureSource {
        fn new<const N: usize>(pairs: [(&str, &str); N]) -> Self {
            Self {
                texts: pairs
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    impl DocumentSource for FixtureSource {
        fn open_text(&self, path: &Path) -> Result<String, RelayError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.texts
                .get(&name)
                .cloned()
                .ok_or_else(|| RelayError::DocumentUnreadable {
                    path: path.to_path_buf(),
                    detail: "fixture missing".to_string(),
                })
        }
    }

    #[derive(Default)]
    struct CountingTransport {
        documents: Mutex<Vec<PathBuf>>,
    }

    impl Transport for CountingTransport {
        async fn send_text(&self, _chat_id: i64, _text: &str) -> Result<(), RelayError> {
            Ok(())
        }
        async fn send_document(
            &self,
            _chat_id: i64,
            file: &Path,
            _caption: &str,
        ) -> Result<(), RelayError> {
            self.documents.lock().unwrap().push(file.to_path_buf());
            Ok(())
        }
        async fn poll_inbound(&self, _offset: i64) -> Result<Vec<Inbound>, RelayError> {
            Ok(Vec::new())
        }
    }

    const PAYSLIP: &str = "1402\nعلی:\nرضایی\nکد ملی 1234567890\nخالص پرداختی 72,600,000";

    #[tokio::test]
    async fn ingest_file_extracts_and_persists() {
        let source = FixtureSource::new([("a.pdf", PAYSLIP)]);
        let store = JsonStore::in_memory();

        let outcome = ingest_file(
            Path::new("/in/a.pdf"),
            &source,
            &store,
            None::<&CountingTransport>,
        )
        .await
        .unwrap();
        assert!(!outcome.notified);

        let records = store.find_by_national_id("1234567890").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, outcome.id);
        assert_eq!(records[0].payslip.net_payment.as_deref(), Some("72600000"));
        assert_eq!(records[0].source_file, Path::new("/in/a.pdf"));
        assert!(records[0].chat_id.is_none());
    }

    #[tokio::test]
    async fn new_record_inherits_binding_and_is_pushed() {
        let source = FixtureSource::new([("a.pdf", PAYSLIP), ("b.pdf", PAYSLIP)]);
        let store = JsonStore::in_memory();
        let transport = CountingTransport::default();

        ingest_file(Path::new("/in/a.pdf"), &source, &store, Some(&transport))
            .await
            .unwrap();
        assert!(transport.documents.lock().unwrap().is_empty(), "no binding yet");

        store.bind_chat("1234567890", 42).unwrap();

        let outcome = ingest_file(Path::new("/in/b.pdf"), &source, &store, Some(&transport))
            .await
            .unwrap();
        assert!(outcome.notified);
        assert_eq!(
            *transport.documents.lock().unwrap(),
            vec![PathBuf::from("/in/b.pdf")]
        );
        let bound = store.find_by_chat(42).unwrap().unwrap();
        assert_eq!(bound.source_file, Path::new("/in/b.pdf"), "newest inherits");
    }

    #[tokio::test]
    async fn unreadable_files_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.pdf", "broken.pdf", "c.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"placeholder").unwrap();
        }
        let source = FixtureSource::new([("a.pdf", PAYSLIP), ("c.PDF", PAYSLIP)]);
        let store = JsonStore::in_memory();

        let report = ingest_dir(
            dir.path(),
            &source,
            &store,
            None::<&CountingTransport>,
        )
        .await
        .unwrap();
        assert_eq!(
            report,
            IngestReport {
                scanned: 3,
                ingested: 2,
                skipped: 1,
                notified: 0
            }
        );
        assert_eq!(store.len(), 2);
    }
}
