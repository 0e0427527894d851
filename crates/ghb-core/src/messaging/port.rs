use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::SendOptions,
    Result,
};

/// Outbound messenger port.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str, opts: SendOptions)
        -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;
}
