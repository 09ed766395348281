use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{InlineKeyboard, MessagingCapabilities},
    Result,
};

/// Outbound chat transport port.
///
/// Implementations must report a refused edit as [`crate::Error::MessageNotEditable`]
/// so the renderer can fall back to sending a fresh message.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef>;

    async fn edit_text(
        &self,
        msg: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
