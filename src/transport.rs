//! Chat transport: the boundary to the messaging platform.
//!
//! The bot and the dispatcher talk to the outside world only through the
//! [`Transport`] trait — three primitives (send text, send document, poll
//! inbound) and nothing else. [`BaleTransport`] implements it against the
//! Bale bot API (Telegram-compatible: `sendMessage`, `sendDocument`,
//! `getUpdates` long poll).
//!
//! Transport failures are returned to the caller and never retried here:
//! the polling loop and the ingestion pipeline decide what a failed send
//! means for them (log and continue).

use crate::config::RelayConfig;
use crate::error::RelayError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// One inbound chat message, as surfaced by [`Transport::poll_inbound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Conversation identifier routing replies to this user.
    pub chat_id: i64,
    /// Message text, trimmed of surrounding whitespace by the transport.
    pub text: String,
    /// Monotonically increasing update id; the caller advances its poll
    /// offset past the highest id it has processed (at-least-once delivery).
    pub update_id: i64,
}

/// Send/receive primitives of the chat platform.
pub trait Transport: Send + Sync {
    /// Send a text message to a chat.
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), RelayError>> + Send;

    /// Send a document (file upload) with a caption to a chat.
    fn send_document(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
    ) -> impl std::future::Future<Output = Result<(), RelayError>> + Send;

    /// Long-poll for inbound messages with update id ≥ `offset`,
    /// ordered by update id.
    fn poll_inbound(
        &self,
        offset: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Inbound>, RelayError>> + Send;
}

// ── Bale API wire types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// [`Transport`] implementation for the Bale bot API.
pub struct BaleTransport {
    client: reqwest::Client,
    base: String,
    poll_timeout_secs: u64,
    send_timeout: Duration,
}

impl BaleTransport {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            poll_timeout_secs: config.poll_timeout_secs,
            send_timeout: Duration::from_secs(config.send_timeout_secs),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    /// Map a response to `Ok(response)` or a status error with the body text.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RelayError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RelayError::TransportStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Transport for BaleTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), RelayError> {
        let response = self
            .client
            .post(self.url("sendMessage"))
            .timeout(self.send_timeout)
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Self::check(response).await?;
        debug!("sent text to chat {chat_id} ({} chars)", text.chars().count());
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
    ) -> Result<(), RelayError> {
        let bytes = tokio::fs::read(file).await.map_err(|e| RelayError::Io {
            path: file.to_path_buf(),
            source: e,
        })?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .client
            .post(self.url("sendDocument"))
            .timeout(self.send_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Self::check(response).await?;
        debug!("sent document {} to chat {chat_id}", file.display());
        Ok(())
    }

    async fn poll_inbound(&self, offset: i64) -> Result<Vec<Inbound>, RelayError> {
        let response = self
            .client
            .get(self.url("getUpdates"))
            // The request must outlive the server-side long-poll window.
            .timeout(Duration::from_secs(self.poll_timeout_secs + 10))
            .query(&[("offset", offset), ("timeout", self.poll_timeout_secs as i64)])
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        let response = Self::check(response).await?;

        let updates: UpdatesResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Transport(format!("decoding getUpdates: {e}")))?;
        if !updates.ok {
            return Err(RelayError::Transport("getUpdates answered ok=false".into()));
        }

        let mut inbound: Vec<Inbound> = updates
            .result
            .into_iter()
            .filter_map(|u| {
                let message = u.message?;
                let text = message.text?;
                Some(Inbound {
                    chat_id: message.chat.id,
                    text: text.trim().to_string(),
                    update_id: u.update_id,
                })
            })
            .collect();
        inbound.sort_by_key(|m| m.update_id);
        Ok(inbound)
    }
}
