//! Document source: raw page text from a file reference.
//!
//! Extraction never touches PDF internals — it consumes plain page text.
//! [`DocumentSource`] is the seam that keeps it that way: production uses
//! [`PdfSource`] (the `pdf-extract` crate), tests inject fixture text and
//! never need a real PDF on disk.

use crate::error::RelayError;
use std::path::Path;

/// Read the raw page text of a source document.
pub trait DocumentSource: Send + Sync {
    /// Full text of all pages, in document order.
    ///
    /// A file that cannot be opened or decoded yields
    /// [`RelayError::DocumentUnreadable`]; partial layouts do not — missing
    /// fields are the extraction engine's concern, not this one's.
    fn open_text(&self, path: &Path) -> Result<String, RelayError>;
}

/// PDF-backed document source.
pub struct PdfSource;

impl DocumentSource for PdfSource {
    fn open_text(&self, path: &Path) -> Result<String, RelayError> {
        pdf_extract::extract_text(path).map_err(|e| RelayError::DocumentUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_document_read_failure() {
        let err = PdfSource
            .open_text(Path::new("/no/such/payslip.pdf"))
            .unwrap_err();
        assert!(matches!(err, RelayError::DocumentUnreadable { .. }));
    }

    #[test]
    fn garbage_bytes_are_a_document_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();
        let err = PdfSource.open_text(&path).unwrap_err();
        assert!(matches!(err, RelayError::DocumentUnreadable { .. }));
    }
}
