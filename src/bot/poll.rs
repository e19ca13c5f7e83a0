//! The inbound long-poll loop.
//!
//! One loop, one offset. After a batch is processed the offset moves past
//! the highest update id seen, acknowledging the batch to the platform.
//! A message that fails to process is logged and skipped — its update id
//! still advances the offset, so one poisoned message cannot wedge the
//! loop. Poll failures back off briefly and retry forever.

use crate::bot::handler::BotHandler;
use crate::store::RecordStore;
use crate::transport::Transport;
use std::time::Duration;
use tracing::{info, warn};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Run the polling loop until the task is cancelled.
pub async fn run<S: RecordStore, T: Transport>(handler: &BotHandler<S>, transport: &T) {
    let mut offset = 0i64;
    info!("bot polling loop started");
    loop {
        match transport.poll_inbound(offset).await {
            Ok(batch) => {
                for inbound in batch {
                    offset = offset.max(inbound.update_id + 1);
                    if let Err(e) = handler.handle(transport, &inbound).await {
                        warn!(
                            chat_id = inbound.chat_id,
                            update_id = inbound.update_id,
                            "message handling failed: {e}"
                        );
                    }
                }
            }
            Err(e) => {
                warn!("poll failed: {e}; retrying in {POLL_RETRY_DELAY:?}");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}
