//! Edit-or-send rendering.
//!
//! Every screen transition and every terminal reply goes through [`render`], so the
//! fallback from a refused edit to a fresh message behaves the same everywhere.

use tracing::debug;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::{port::MessagingPort, types::InlineKeyboard},
    Error, Result,
};

/// Show `text` (and optional buttons) in `chat_id`.
///
/// With `existing` set, the message is edited in place; if the transport refuses the
/// edit the same content is sent as a new message. Without `existing` a new message
/// is always sent. Any other transport failure is returned to the caller.
///
/// Returns the message that now displays the content.
pub async fn render(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    existing: Option<MessageId>,
    text: &str,
    keyboard: Option<&InlineKeyboard>,
) -> Result<MessageRef> {
    let caps = messenger.capabilities();
    let text = clamp_len(text, caps.max_message_len);
    let keyboard = keyboard.filter(|k| caps.supports_inline_keyboards && !k.is_empty());

    if let Some(message_id) = existing.filter(|_| caps.supports_edit) {
        let msg = MessageRef {
            chat_id,
            message_id,
        };
        match messenger.edit_text(msg, &text, keyboard).await {
            Ok(()) => return Ok(msg),
            Err(Error::MessageNotEditable(reason)) => {
                debug!(
                    chat_id = chat_id.0,
                    message_id = message_id.0,
                    %reason,
                    "edit refused, sending new message"
                );
            }
            Err(e) => return Err(e),
        }
    }

    messenger.send_text(chat_id, &text, keyboard).await
}

fn clamp_len(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
