//! Field extraction from normalized payslip text.
//!
//! Each submodule implements exactly one stage, so the rule table can grow
//! and the normalizer can change without touching the engine.
//!
//! ## Data Flow
//!
//! ```text
//! raw text ──▶ normalize ──▶ engine (rules) ──▶ PayslipRecord
//! (reshaped)   (NFC, trim)   (header + anchors)  (typed, partial)
//! ```
//!
//! 1. [`normalize`] — split, trim, drop empties, Unicode NFC per line
//! 2. [`rules`]     — the declarative rule table: one positional header rule
//!    plus per-field anchor keywords and capture patterns
//! 3. [`engine`]    — applies the table to the line sequence; a pure function,
//!    so identical input always yields an identical record

pub mod engine;
pub mod normalize;
pub mod rules;
