use crate::domain::{ChatId, MessageRef, UserId};

/// Incoming update model, already stripped of Telegram specifics.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Text(TextMessage),
    Callback(CallbackQuery),
}

/// A slash command. `text` keeps the whole message, since a pending prompt may claim it.
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub name: String,
    pub text: String,
}

/// Any non-command message. `text` is empty for messages without text or caption.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub user_id: UserId,
    pub username: Option<String>,
    pub callback_id: String,
    pub data: String,
    /// The message carrying the pressed button; absent for inaccessible messages.
    pub message: Option<MessageRef>,
}

/// Inline keyboard laid out one button per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn push(&mut self, label: impl Into<String>, callback_data: impl Into<String>) {
        self.buttons.push(InlineButton {
            label: label.into(),
            callback_data: callback_data.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub supports_inline_keyboards: bool,
    pub max_message_len: usize,
}
