//! The recipient chat bot: registration and payslip delivery.
//!
//! ## Why two secrets?
//!
//! A national id alone is weak — ids leak, and payroll data must not. A
//! recipient proves their identity by answering with the personnel number
//! the verification ledger expects for that id; only then is their chat
//! bound to the payroll records. Delivery is further rate-limited by a
//! per-record cooldown.
//!
//! The conversation logic is split so each piece stays testable on its own:
//!
//! * [`state`]   — the pure state machine (no I/O, no clock)
//! * [`messages`]— every user-visible string, in one place
//! * [`handler`] — wires outcomes to storage and the transport
//! * [`poll`]    — the long-poll loop feeding the handler

pub mod handler;
pub mod messages;
pub mod poll;
pub mod state;

pub use handler::BotHandler;
pub use state::{ConversationMap, ConversationState, Outcome};
