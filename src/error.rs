//! Error types for the payslip-relay library.
//!
//! The error enum covers genuine failures only. Three common situations are
//! deliberately *not* errors here:
//!
//! * **Field absence** — an extraction rule that matches no line leaves the
//!   field `None` in [`crate::record::PayslipRecord`]. A payslip with an
//!   unusual layout is still a payslip.
//! * **Verification mismatch** — a wrong personnel number during
//!   registration is an ordinary dialogue outcome; the conversation returns
//!   to idle and the user starts over.
//! * **Cooldown** — a retrieval request inside the cooldown window is an
//!   expected policy outcome, answered with a message.
//!
//! What remains: documents that cannot be read at all, a ledger or store
//! that fails, and transport requests that error out. Transport and store
//! failures are fatal for the single operation only — the polling loop and
//! the ingestion pipeline log them and continue with the next message or
//! document. Only startup failures (unreadable ledger, unopenable store)
//! should terminate the process.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the payslip-relay library.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The source document could not be opened or decoded.
    ///
    /// Distinct from field-level absence: this is the whole file failing,
    /// and the ingestion pipeline skips it and moves on.
    #[error("cannot read document '{path}': {detail}")]
    DocumentUnreadable { path: PathBuf, detail: String },

    // ── Startup errors ────────────────────────────────────────────────────
    /// The verification ledger could not be loaded. Fatal at boot.
    #[error("cannot load verification ledger '{path}': {detail}")]
    LedgerUnreadable { path: PathBuf, detail: String },

    // ── Store errors ──────────────────────────────────────────────────────
    /// A record store operation failed.
    #[error("record store failure: {0}")]
    Store(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// A file or directory could not be read or written.
    #[error("failed to read or write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The chat transport request failed before a response arrived
    /// (connection refused, timeout, TLS failure).
    #[error("transport request failed: {0}")]
    Transport(String),

    /// The chat transport answered with a non-success HTTP status.
    #[error("transport returned HTTP {status}: {body}")]
    TransportStatus { status: u16, body: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
