//! The registration state machine.
//!
//! [`step`] is a pure function from (state, inbound text, ledger) to
//! (next state, outcome): no storage, no transport, no clock. The handler
//! interprets outcomes; this module only decides them.
//!
//! States are per chat. `Idle` is the implicit default — idle chats are not
//! kept in the [`ConversationMap`] at all, so an inactive recipient costs
//! nothing.

use crate::extract::engine::normalize_number;
use crate::ledger::VerificationLedger;
use std::collections::HashMap;
use std::sync::Mutex;

/// Where one chat currently stands in the registration dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    /// No dialogue in progress.
    #[default]
    Idle,
    /// `/start` was received; the next message should be a national id.
    AwaitingNationalId,
    /// A ledger-known national id was received; the next message must be
    /// the matching personnel number.
    AwaitingPersonnelNumber { national_id: String },
}

/// What the handler should do after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ask for the national id.
    PromptNationalId,
    /// The reply was not a ten-digit id; the dialogue starts over.
    MalformedNationalId,
    /// The id is not in the ledger; the dialogue starts over.
    UnknownNationalId,
    /// Id accepted; ask for the personnel number.
    PromptPersonnelNumber,
    /// Both secrets matched — bind the chat to this identity.
    Verified { national_id: String },
    /// Personnel number did not match; the dialogue starts over.
    PersonnelMismatch,
    /// The recipient asked for their payslip.
    RequestPayslip,
    /// Anything else.
    Help,
}

fn is_national_id(text: &str) -> bool {
    text.len() == 10 && text.bytes().all(|b| b.is_ascii_digit())
}

/// Advance one chat's dialogue by one inbound message.
///
/// Commands win over state: `/start` restarts the dialogue from anywhere,
/// and a payslip request is honored from anywhere (delivery itself checks
/// registration). Digits are folded to ASCII first, so ids typed on a
/// Persian keyboard work.
pub fn step(
    state: ConversationState,
    text: &str,
    ledger: &VerificationLedger,
) -> (ConversationState, Outcome) {
    let text = normalize_number(text.trim());
    let command = text.to_lowercase();

    if command == "/start" || command == "start" {
        return (ConversationState::AwaitingNationalId, Outcome::PromptNationalId);
    }
    if command == "/payslip" || command == "get-payslip" {
        return (ConversationState::Idle, Outcome::RequestPayslip);
    }

    match state {
        ConversationState::Idle => {
            // A bare ten-digit message is treated as an id submission even
            // without /start; the personnel challenge still follows.
            if is_national_id(&text) {
                submit_national_id(text, ledger)
            } else {
                (ConversationState::Idle, Outcome::Help)
            }
        }
        ConversationState::AwaitingNationalId => {
            // Any reply that does not verify returns the dialogue to idle;
            // there is no retry-in-place anywhere in the flow.
            if is_national_id(&text) {
                submit_national_id(text, ledger)
            } else {
                (ConversationState::Idle, Outcome::MalformedNationalId)
            }
        }
        ConversationState::AwaitingPersonnelNumber { national_id } => {
            if ledger.expected_personnel(&national_id) == Some(text.as_str()) {
                (ConversationState::Idle, Outcome::Verified { national_id })
            } else {
                (ConversationState::Idle, Outcome::PersonnelMismatch)
            }
        }
    }
}

fn submit_national_id(
    national_id: String,
    ledger: &VerificationLedger,
) -> (ConversationState, Outcome) {
    if ledger.contains(&national_id) {
        (
            ConversationState::AwaitingPersonnelNumber { national_id },
            Outcome::PromptPersonnelNumber,
        )
    } else {
        (ConversationState::Idle, Outcome::UnknownNationalId)
    }
}

/// Per-chat dialogue states, shared across handler invocations.
#[derive(Debug, Default)]
pub struct ConversationMap {
    inner: Mutex<HashMap<i64, ConversationState>>,
}

impl ConversationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the dialogue of one chat and persist the resulting state.
    /// Chats that land back in `Idle` are dropped from the map.
    pub fn advance(&self, chat_id: i64, text: &str, ledger: &VerificationLedger) -> Outcome {
        let mut inner = self.inner.lock().unwrap();
        let state = inner.remove(&chat_id).unwrap_or_default();
        let (next, outcome) = step(state, text, ledger);
        if next != ConversationState::Idle {
            inner.insert(chat_id, next);
        }
        outcome
    }

    /// Number of chats with a dialogue in progress.
    pub fn active(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> VerificationLedger {
        VerificationLedger::from_entries([
            ("1234567890".to_string(), "4521".to_string()),
            ("0987654321".to_string(), "P9".to_string()),
        ])
    }

    #[test]
    fn happy_path_start_to_verified() {
        let l = ledger();
        let (s, o) = step(ConversationState::Idle, "/start", &l);
        assert_eq!(o, Outcome::PromptNationalId);
        let (s, o) = step(s, "1234567890", &l);
        assert_eq!(o, Outcome::PromptPersonnelNumber);
        let (s, o) = step(s, "4521", &l);
        assert_eq!(
            o,
            Outcome::Verified {
                national_id: "1234567890".to_string()
            }
        );
        assert_eq!(s, ConversationState::Idle);
    }

    #[test]
    fn start_is_case_insensitive_and_works_without_slash() {
        let l = ledger();
        for cmd in ["/START", "Start", "/Start"] {
            let (s, o) = step(ConversationState::Idle, cmd, &l);
            assert_eq!(o, Outcome::PromptNationalId, "command {cmd}");
            assert_eq!(s, ConversationState::AwaitingNationalId);
        }
    }

    #[test]
    fn bare_national_id_shortcuts_start_but_not_the_challenge() {
        let l = ledger();
        let (s, o) = step(ConversationState::Idle, "1234567890", &l);
        assert_eq!(o, Outcome::PromptPersonnelNumber);
        assert_eq!(
            s,
            ConversationState::AwaitingPersonnelNumber {
                national_id: "1234567890".to_string()
            }
        );
    }

    #[test]
    fn persian_digit_id_is_accepted() {
        let l = ledger();
        let (_, o) = step(ConversationState::AwaitingNationalId, "۱۲۳۴۵۶۷۸۹۰", &l);
        assert_eq!(o, Outcome::PromptPersonnelNumber);
    }

    #[test]
    fn unknown_id_resets_the_dialogue() {
        let l = ledger();
        let (s, o) = step(ConversationState::AwaitingNationalId, "1111111111", &l);
        assert_eq!(o, Outcome::UnknownNationalId);
        assert_eq!(s, ConversationState::Idle, "expected Idle after unknown id");
        // Same from the idle shortcut.
        let (s, o) = step(ConversationState::Idle, "1111111111", &l);
        assert_eq!(o, Outcome::UnknownNationalId);
        assert_eq!(s, ConversationState::Idle);
    }

    #[test]
    fn malformed_id_resets_the_dialogue() {
        let l = ledger();
        let (s, o) = step(ConversationState::AwaitingNationalId, "12345", &l);
        assert_eq!(o, Outcome::MalformedNationalId);
        assert_eq!(s, ConversationState::Idle);
    }

    #[test]
    fn awaiting_national_id_lasts_exactly_one_message() {
        // Whatever the reply, the state after one message is never
        // AwaitingNationalId again.
        let l = ledger();
        for reply in ["1111111111", "12345", "سلام", "4521"] {
            let (s, _) = step(ConversationState::AwaitingNationalId, reply, &l);
            assert_ne!(s, ConversationState::AwaitingNationalId, "reply {reply}");
        }
    }

    #[test]
    fn personnel_mismatch_resets_the_dialogue() {
        let l = ledger();
        let state = ConversationState::AwaitingPersonnelNumber {
            national_id: "1234567890".to_string(),
        };
        let (s, o) = step(state, "9999", &l);
        assert_eq!(o, Outcome::PersonnelMismatch);
        assert_eq!(s, ConversationState::Idle);
    }

    #[test]
    fn start_restarts_from_the_personnel_stage() {
        let l = ledger();
        let state = ConversationState::AwaitingPersonnelNumber {
            national_id: "1234567890".to_string(),
        };
        let (s, o) = step(state, "/start", &l);
        assert_eq!(o, Outcome::PromptNationalId);
        assert_eq!(s, ConversationState::AwaitingNationalId);
    }

    #[test]
    fn payslip_request_works_from_any_state() {
        let l = ledger();
        for state in [
            ConversationState::Idle,
            ConversationState::AwaitingNationalId,
            ConversationState::AwaitingPersonnelNumber {
                national_id: "1234567890".to_string(),
            },
        ] {
            let (s, o) = step(state, "/payslip", &l);
            assert_eq!(o, Outcome::RequestPayslip);
            assert_eq!(s, ConversationState::Idle);
        }
        let (_, o) = step(ConversationState::Idle, "get-payslip", &l);
        assert_eq!(o, Outcome::RequestPayslip);
    }

    #[test]
    fn anything_else_in_idle_is_help() {
        let l = ledger();
        let (s, o) = step(ConversationState::Idle, "سلام", &l);
        assert_eq!(o, Outcome::Help);
        assert_eq!(s, ConversationState::Idle);
    }

    #[test]
    fn map_drops_idle_dialogues() {
        let l = ledger();
        let map = ConversationMap::new();
        assert_eq!(map.advance(42, "/start", &l), Outcome::PromptNationalId);
        assert_eq!(map.active(), 1);
        assert_eq!(
            map.advance(42, "1234567890", &l),
            Outcome::PromptPersonnelNumber
        );
        let outcome = map.advance(42, "4521", &l);
        assert!(matches!(outcome, Outcome::Verified { .. }));
        assert_eq!(map.active(), 0, "verified chat returns to idle");

        map.advance(42, "/start", &l);
        assert_eq!(map.advance(42, "1111111111", &l), Outcome::UnknownNationalId);
        assert_eq!(map.active(), 0, "unknown id drops the dialogue");
    }
}
