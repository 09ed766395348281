use teloxide::types::CallbackQuery;

use ptb_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{self, IncomingUpdate},
};

/// Button presses always reach the controller, even without data, so they get answered.
pub(super) fn to_update(q: &CallbackQuery) -> IncomingUpdate {
    IncomingUpdate::Callback(types::CallbackQuery {
        user_id: UserId(q.from.id.0 as i64),
        username: q.from.username.clone(),
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        message: q.message.as_ref().map(|m| MessageRef {
            chat_id: ChatId(m.chat.id.0),
            message_id: MessageId(m.id.0),
        }),
    })
}
