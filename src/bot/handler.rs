//! Wires conversation outcomes to storage and the chat transport.
//!
//! The handler owns the store handle, the verification ledger, and the
//! per-chat dialogue map. Each inbound message is processed independently:
//! advance the state machine, then act on the outcome — reply, bind a chat,
//! or deliver a payslip. Time enters only through `handle_at`, so the
//! cooldown is testable with a fixed clock.

use crate::bot::messages;
use crate::bot::state::{ConversationMap, Outcome};
use crate::error::RelayError;
use crate::ledger::VerificationLedger;
use crate::notify;
use crate::store::RecordStore;
use crate::transport::{Inbound, Transport};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Message-to-action dispatcher for the recipient bot.
pub struct BotHandler<S: RecordStore> {
    store: S,
    ledger: VerificationLedger,
    conversations: ConversationMap,
    cooldown: Duration,
}

impl<S: RecordStore> BotHandler<S> {
    pub fn new(store: S, ledger: VerificationLedger, cooldown: Duration) -> Self {
        Self {
            store,
            ledger,
            conversations: ConversationMap::new(),
            cooldown,
        }
    }

    /// Process one inbound message against the current wall clock.
    pub async fn handle<T: Transport>(
        &self,
        transport: &T,
        inbound: &Inbound,
    ) -> Result<(), RelayError> {
        self.handle_at(transport, inbound, Utc::now()).await
    }

    /// Process one inbound message at an explicit instant.
    pub async fn handle_at<T: Transport>(
        &self,
        transport: &T,
        inbound: &Inbound,
        now: DateTime<Utc>,
    ) -> Result<(), RelayError> {
        let chat_id = inbound.chat_id;
        let outcome = self
            .conversations
            .advance(chat_id, &inbound.text, &self.ledger);
        debug!(chat_id, ?outcome, "dialogue advanced");

        match outcome {
            Outcome::PromptNationalId => {
                transport.send_text(chat_id, messages::PROMPT_NATIONAL_ID).await
            }
            Outcome::MalformedNationalId => {
                transport
                    .send_text(chat_id, messages::MALFORMED_NATIONAL_ID)
                    .await
            }
            Outcome::UnknownNationalId => {
                transport
                    .send_text(chat_id, messages::UNKNOWN_NATIONAL_ID)
                    .await
            }
            Outcome::PromptPersonnelNumber => {
                transport.send_text(chat_id, messages::PROMPT_PERSONNEL).await
            }
            Outcome::Verified { national_id } => {
                let bound = self.store.bind_chat(&national_id, chat_id)?;
                info!(chat_id, bound, "recipient verified and bound");
                transport
                    .send_text(chat_id, &messages::registered(&national_id))
                    .await?;
                if bound == 0 {
                    // Registration succeeded but no payroll records exist
                    // yet; the binding takes effect on the next ingestion.
                    transport.send_text(chat_id, messages::NO_RECORDS).await?;
                }
                Ok(())
            }
            Outcome::PersonnelMismatch => {
                transport
                    .send_text(chat_id, messages::PERSONNEL_MISMATCH)
                    .await
            }
            Outcome::RequestPayslip => self.deliver(transport, chat_id, now).await,
            Outcome::Help => transport.send_text(chat_id, messages::HELP).await,
        }
    }

    /// Deliver the latest payslip bound to this chat, honoring the cooldown.
    async fn deliver<T: Transport>(
        &self,
        transport: &T,
        chat_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), RelayError> {
        let Some(bound) = self.store.find_by_chat(chat_id)? else {
            return transport.send_text(chat_id, messages::NOT_REGISTERED).await;
        };

        if let Some(last) = bound.last_retrieved {
            // Strictly inside the window blocks; exactly at the boundary
            // permits.
            if now - last < self.cooldown {
                info!(chat_id, record = bound.id, "delivery blocked by cooldown");
                return transport.send_text(chat_id, messages::COOLDOWN).await;
            }
        }

        // Prefer the newest record for the bound identity; the chat-bound
        // record itself is the fallback when the id is missing.
        let record = match bound.payslip.national_id.clone() {
            Some(nid) => self
                .store
                .find_by_national_id(&nid)?
                .into_iter()
                .next()
                .unwrap_or(bound),
            None => bound,
        };

        notify::dispatch(transport, chat_id, &record).await?;
        self.store.mark_retrieved(record.id, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PayslipRecord, StoredRecord};
    use crate::store::JsonStore;
    use chrono::TimeZone;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Records everything sent; never fails.
    #[derive(Default)]
    struct FakeTransport {
        texts: Mutex<Vec<(i64, String)>>,
        documents: Mutex<Vec<(i64, PathBuf)>>,
    }

    impl FakeTransport {
        fn texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
        }
        fn documents(&self) -> usize {
            self.documents.lock().unwrap().len()
        }
    }

    impl Transport for FakeTransport {
        async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), RelayError> {
            self.texts.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
        async fn send_document(
            &self,
            chat_id: i64,
            file: &Path,
            _caption: &str,
        ) -> Result<(), RelayError> {
            self.documents
                .lock()
                .unwrap()
                .push((chat_id, file.to_path_buf()));
            Ok(())
        }
        async fn poll_inbound(&self, _offset: i64) -> Result<Vec<Inbound>, RelayError> {
            Ok(Vec::new())
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn seed_record(store: &JsonStore, national_id: &str, ingested_at: DateTime<Utc>) {
        store
            .create(StoredRecord {
                id: 0,
                payslip: PayslipRecord {
                    national_id: Some(national_id.to_string()),
                    month: Some("بهمن".into()),
                    year: Some("1402".into()),
                    ..Default::default()
                },
                source_file: PathBuf::from("/in/payslip.pdf"),
                chat_id: None,
                last_retrieved: None,
                ingested_at,
            })
            .unwrap();
    }

    fn handler(store: JsonStore) -> BotHandler<JsonStore> {
        let ledger = VerificationLedger::from_entries([(
            "1234567890".to_string(),
            "4521".to_string(),
        )]);
        BotHandler::new(store, ledger, Duration::days(28))
    }

    fn msg(chat_id: i64, text: &str) -> Inbound {
        Inbound {
            chat_id,
            text: text.to_string(),
            update_id: 0,
        }
    }

    #[tokio::test]
    async fn registration_binds_the_chat_and_delivers_on_request() {
        let store = JsonStore::in_memory();
        seed_record(&store, "1234567890", at(1));
        let handler = handler(store);
        let transport = FakeTransport::default();

        for text in ["/start", "1234567890", "4521"] {
            handler
                .handle_at(&transport, &msg(42, text), at(2))
                .await
                .unwrap();
        }
        let texts = transport.texts();
        assert_eq!(texts[0], messages::PROMPT_NATIONAL_ID);
        assert_eq!(texts[1], messages::PROMPT_PERSONNEL);
        assert!(texts[2].contains("1234567890"));

        handler
            .handle_at(&transport, &msg(42, "/payslip"), at(3))
            .await
            .unwrap();
        assert_eq!(transport.documents(), 1);
    }

    #[tokio::test]
    async fn unregistered_chat_cannot_retrieve() {
        let handler = handler(JsonStore::in_memory());
        let transport = FakeTransport::default();
        handler
            .handle_at(&transport, &msg(7, "/payslip"), at(1))
            .await
            .unwrap();
        assert_eq!(transport.texts(), vec![messages::NOT_REGISTERED.to_string()]);
        assert_eq!(transport.documents(), 0);
    }

    #[tokio::test]
    async fn verification_without_records_says_so() {
        let handler = handler(JsonStore::in_memory());
        let transport = FakeTransport::default();
        for text in ["/start", "1234567890", "4521"] {
            handler
                .handle_at(&transport, &msg(42, text), at(1))
                .await
                .unwrap();
        }
        let texts = transport.texts();
        assert_eq!(texts.last().map(String::as_str), Some(messages::NO_RECORDS));
    }

    #[tokio::test]
    async fn cooldown_blocks_inside_and_permits_at_the_boundary() {
        let store = JsonStore::in_memory();
        seed_record(&store, "1234567890", at(1));
        let handler = handler(store);
        let transport = FakeTransport::default();

        for text in ["/start", "1234567890", "4521"] {
            handler
                .handle_at(&transport, &msg(42, text), at(1))
                .await
                .unwrap();
        }
        handler
            .handle_at(&transport, &msg(42, "/payslip"), at(1))
            .await
            .unwrap();
        assert_eq!(transport.documents(), 1);

        // One day later: blocked.
        handler
            .handle_at(&transport, &msg(42, "/payslip"), at(2))
            .await
            .unwrap();
        assert_eq!(transport.documents(), 1);
        assert_eq!(
            transport.texts().last().map(String::as_str),
            Some(messages::COOLDOWN)
        );

        // Exactly 28 days later: permitted.
        handler
            .handle_at(&transport, &msg(42, "/payslip"), at(29))
            .await
            .unwrap();
        assert_eq!(transport.documents(), 2);
    }

    #[tokio::test]
    async fn delivery_picks_the_newest_record() {
        let store = JsonStore::in_memory();
        seed_record(&store, "1234567890", at(1));
        seed_record(&store, "1234567890", at(5));
        let handler = handler(store);
        let transport = FakeTransport::default();

        for text in ["/start", "1234567890", "4521", "/payslip"] {
            handler
                .handle_at(&transport, &msg(42, text), at(6))
                .await
                .unwrap();
        }
        assert_eq!(transport.documents(), 1);
        // The summary went out before the document.
        let texts = transport.texts();
        assert!(texts.last().map(|t| t.starts_with("فیش حقوقی")).unwrap_or(false));
    }

    #[tokio::test]
    async fn wrong_personnel_number_does_not_bind() {
        let store = JsonStore::in_memory();
        seed_record(&store, "1234567890", at(1));
        let handler = handler(store);
        let transport = FakeTransport::default();

        for text in ["/start", "1234567890", "0000"] {
            handler
                .handle_at(&transport, &msg(42, text), at(2))
                .await
                .unwrap();
        }
        assert_eq!(
            transport.texts().last().map(String::as_str),
            Some(messages::PERSONNEL_MISMATCH)
        );

        handler
            .handle_at(&transport, &msg(42, "/payslip"), at(2))
            .await
            .unwrap();
        assert_eq!(
            transport.texts().last().map(String::as_str),
            Some(messages::NOT_REGISTERED)
        );
    }
}
