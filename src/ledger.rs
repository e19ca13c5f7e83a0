//! The verification ledger: national id → expected personnel number.
//!
//! Loaded once at startup from a two-column CSV and read-only for the
//! lifetime of the process. The ledger is used solely to authenticate
//! registration: knowing a national id is not enough to bind a chat to a
//! payroll identity — the recipient must also answer with the personnel
//! number the ledger expects for that id.

use crate::error::RelayError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Immutable mapping from national identifier to expected personnel number.
#[derive(Debug, Clone, Default)]
pub struct VerificationLedger {
    entries: HashMap<String, String>,
}

impl VerificationLedger {
    /// Load the ledger from a CSV file.
    ///
    /// Expected format: a header line followed by
    /// `national_id,personnel_number` rows. Surrounding whitespace is
    /// trimmed; blank lines are ignored; rows without a comma are skipped
    /// with a warning. An unreadable file is a fatal startup error.
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let raw = std::fs::read_to_string(path).map_err(|e| RelayError::LedgerUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let mut entries = HashMap::new();
        // Skip the header line.
        for (lineno, line) in raw.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once(',') {
                Some((national_id, personnel)) => {
                    let national_id = national_id.trim();
                    let personnel = personnel.trim();
                    if national_id.is_empty() || personnel.is_empty() {
                        warn!("ledger {}: line {} has an empty column, skipped", path.display(), lineno + 1);
                        continue;
                    }
                    entries.insert(national_id.to_string(), personnel.to_string());
                }
                None => {
                    warn!("ledger {}: line {} is not a two-column row, skipped", path.display(), lineno + 1);
                }
            }
        }

        info!("loaded verification ledger: {} entries from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    /// Build a ledger from in-memory pairs. Intended for tests.
    pub fn from_entries<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    /// True if the national id is known to the ledger.
    pub fn contains(&self, national_id: &str) -> bool {
        self.entries.contains_key(national_id)
    }

    /// The personnel number the ledger expects for this national id.
    pub fn expected_personnel(&self, national_id: &str) -> Option<&str> {
        self.entries.get(national_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_two_column_csv() {
        let f = write_csv("national_id,personnel_number\n1234567890,P9\n0987654321, P10 \n");
        let ledger = VerificationLedger::load(f.path()).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("1234567890"));
        assert_eq!(ledger.expected_personnel("1234567890"), Some("P9"));
        assert_eq!(ledger.expected_personnel("0987654321"), Some("P10"));
    }

    #[test]
    fn skips_blank_and_malformed_rows() {
        let f = write_csv("national_id,personnel_number\n\nnot-a-row\n1234567890,P9\n,\n");
        let ledger = VerificationLedger::load(f.path()).unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = VerificationLedger::load(Path::new("/definitely/missing.csv")).unwrap_err();
        assert!(matches!(err, RelayError::LedgerUnreadable { .. }));
    }

    #[test]
    fn unknown_id_yields_none() {
        let ledger = VerificationLedger::from_entries([("1".to_string(), "P".to_string())]);
        assert!(!ledger.contains("2"));
        assert_eq!(ledger.expected_personnel("2"), None);
    }
}
