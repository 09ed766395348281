//! Telegram adapter (teloxide).
//!
//! Implements the `ptb-core` MessagingPort over the Telegram Bot API and feeds
//! updates from long polling into the core controller.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    RequestError,
};

use tokio::time::sleep;
use tracing::warn;

pub mod handlers;
pub mod router;

use ptb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

const MAX_MESSAGE_LEN: usize = 4096;

/// Fragments of Telegram's descriptions for edits that can never succeed.
const NOT_EDITABLE: [&str; 4] = [
    "message is not modified",
    "message can't be edited",
    "message to edit not found",
    "there is no text in the message to edit",
];

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        if let RequestError::Api(api) = &e {
            let description = api.to_string();
            if is_not_editable(&description) {
                return Error::MessageNotEditable(description);
            }
        }
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    warn!(retry_after = ?d, "telegram rate limit hit, retrying once");
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

fn is_not_editable(description: &str) -> bool {
    let lower = description.to_lowercase();
    NOT_EDITABLE.iter().any(|frag| lower.contains(frag))
}

/// One button per row, in order.
fn markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .buttons
        .iter()
        .map(|b| {
            vec![InlineKeyboardButton::callback(
                b.label.clone(),
                b.callback_data.clone(),
            )]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: true,
            supports_inline_keyboards: true,
            max_message_len: MAX_MESSAGE_LEN,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef> {
        let reply_markup = keyboard.map(markup);
        let msg = self
            .with_retry(|| {
                let req = self.bot.send_message(Self::tg_chat(chat_id), text.to_string());
                match &reply_markup {
                    Some(m) => req.reply_markup(m.clone()),
                    None => req,
                }
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_text(
        &self,
        msg: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let reply_markup = keyboard.map(markup);
        self.with_retry(|| {
            let req = self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                text.to_string(),
            );
            match &reply_markup {
                Some(m) => req.reply_markup(m.clone()),
                None => req,
            }
        })
        .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}
