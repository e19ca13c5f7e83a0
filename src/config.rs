//! Configuration for the relay service.
//!
//! Everything the transport and the bot need to run is collected in
//! [`RelayConfig`], built via its [`RelayConfigBuilder`]. Extraction takes no
//! configuration at all — the rule table is fixed — so a library user who
//! only extracts records never touches this module.

use crate::error::RelayError;
use chrono::Duration;
use std::fmt;

/// Default chat API endpoint (Telegram-compatible Bale API).
pub const DEFAULT_API_BASE: &str = "https://tapi.bale.ai";

/// Minimum elapsed time between two successful payslip retrievals by the
/// same recipient, in days.
pub const DEFAULT_COOLDOWN_DAYS: i64 = 28;

/// Configuration for the chat transport and the recipient bot.
///
/// Built via [`RelayConfig::builder()`].
///
/// # Example
/// ```rust
/// use payslip_relay::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .bot_token("123:abc")
///     .cooldown_days(28)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RelayConfig {
    /// Bot token issued by the chat platform. Required, never logged.
    pub bot_token: String,

    /// Base URL of the chat API. Default: [`DEFAULT_API_BASE`].
    ///
    /// Overridable so tests and self-hosted gateways can point the transport
    /// at a local server.
    pub api_base: String,

    /// Retrieval cooldown. Default: 28 days.
    ///
    /// A request made before the window has fully elapsed is answered with a
    /// cooldown message and no document. A request at exactly the window
    /// boundary is permitted.
    pub cooldown: Duration,

    /// Long-poll timeout passed to the transport's `getUpdates`, in seconds.
    /// Default: 30. Range: 1–300.
    pub poll_timeout_secs: u64,

    /// Per-request timeout for outbound sends, in seconds. Default: 30.
    pub send_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            cooldown: Duration::days(DEFAULT_COOLDOWN_DAYS),
            poll_timeout_secs: 30,
            send_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The token is a credential; show only whether it is set.
        f.debug_struct("RelayConfig")
            .field("bot_token", &if self.bot_token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("api_base", &self.api_base)
            .field("cooldown", &self.cooldown)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .finish()
    }
}

impl RelayConfig {
    /// Create a new builder for `RelayConfig`.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    pub fn bot_token(mut self, token: impl Into<String>) -> Self {
        self.config.bot_token = token.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn cooldown_days(mut self, days: i64) -> Self {
        self.config.cooldown = Duration::days(days);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn poll_timeout_secs(mut self, secs: u64) -> Self {
        self.config.poll_timeout_secs = secs;
        self
    }

    pub fn send_timeout_secs(mut self, secs: u64) -> Self {
        self.config.send_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RelayConfig, RelayError> {
        let c = &self.config;
        if c.bot_token.trim().is_empty() {
            return Err(RelayError::InvalidConfig("bot token must not be empty".into()));
        }
        if c.api_base.trim().is_empty() {
            return Err(RelayError::InvalidConfig("api base must not be empty".into()));
        }
        if c.cooldown <= Duration::zero() {
            return Err(RelayError::InvalidConfig(
                "cooldown must be positive".into(),
            ));
        }
        if c.poll_timeout_secs == 0 || c.poll_timeout_secs > 300 {
            return Err(RelayError::InvalidConfig(format!(
                "poll timeout must be 1–300 s, got {}",
                c.poll_timeout_secs
            )));
        }
        Ok(self.config)
    }
}
