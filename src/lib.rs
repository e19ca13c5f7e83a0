//! # payslip-relay
//!
//! Extract structured payroll records from semi-structured, right-to-left
//! (Persian) payslip PDFs and deliver each record to its verified recipient
//! through a stateful chat-bot conversation.
//!
//! ## Why this crate?
//!
//! Payslip PDFs produced by payroll software carry no reliable layout: the
//! text comes out reshaped (Arabic presentation forms), reversed, and with
//! labels and values scattered across lines. Instead of layout-aware parsing,
//! this crate normalises the raw page text and runs a declarative rule table
//! (anchor keywords + capture patterns) over the lines, tolerating missing or
//! reordered fields. Delivery is gated behind a two-secret registration
//! dialogue and a retrieval cooldown so a payslip only ever reaches the
//! person it belongs to.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF file
//!  │
//!  ├─ 1. Source     read raw page text (pdf-extract)
//!  ├─ 2. Normalize  trim, drop empties, Unicode NFC per line
//!  ├─ 3. Extract    header rule + keyword rule table → PayslipRecord
//!  ├─ 4. Persist    enrich with file ref + timestamps, store as JSON
//!  └─ 5. Notify     push to an already-bound chat, if any
//!
//! Chat bot (pull path)
//!  │
//!  ├─ poll inbound  long-poll the chat transport
//!  ├─ register      national id → personnel number challenge (ledger)
//!  └─ deliver       summary text + PDF document, 28-day cooldown
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use payslip_relay::{extract, normalize_lines, DocumentSource, PdfSource};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = PdfSource;
//!     let text = source.open_text("payslip.pdf".as_ref())?;
//!     let record = extract(&normalize_lines(&text));
//!     println!("net payment: {:?}", record.net_payment);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `payslip-relay` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! payslip-relay = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod bot;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod ledger;
pub mod notify;
pub mod record;
pub mod source;
pub mod store;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use bot::{BotHandler, ConversationMap, ConversationState};
pub use config::{RelayConfig, RelayConfigBuilder};
pub use error::RelayError;
pub use extract::engine::extract;
pub use extract::normalize::normalize_lines;
pub use ingest::{ingest_dir, ingest_file, IngestReport, IngestedFile};
pub use ledger::VerificationLedger;
pub use record::{PayslipRecord, StoredRecord};
pub use source::{DocumentSource, PdfSource};
pub use store::{JsonStore, RecordStore};
pub use transport::{BaleTransport, Inbound, Transport};
