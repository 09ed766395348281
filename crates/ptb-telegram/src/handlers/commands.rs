use teloxide::types::Message;

use ptb_core::{
    domain::{ChatId, UserId},
    messaging::types::{Command, IncomingUpdate, TextMessage},
};

/// Command name from `/cmd@botname args...`, lowercased.
fn command_name(text: &str) -> String {
    text.trim()
        .split(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Slash-prefixed text becomes a command carrying the raw text; everything else
/// (captions included) is plain text.
/// Messages without a sender are dropped.
pub(super) fn to_update(msg: &Message) -> Option<IncomingUpdate> {
    let user = msg.from()?;
    let chat_id = ChatId(msg.chat.id.0);
    let user_id = UserId(user.id.0 as i64);
    let username = user.username.clone();
    let text = msg.text().or_else(|| msg.caption()).unwrap_or("");
    Some(classify(chat_id, user_id, username, text))
}

fn classify(
    chat_id: ChatId,
    user_id: UserId,
    username: Option<String>,
    text: &str,
) -> IncomingUpdate {
    if text.starts_with('/') {
        return IncomingUpdate::Command(Command {
            chat_id,
            user_id,
            username,
            name: command_name(text),
            text: text.to_string(),
        });
    }
    IncomingUpdate::Text(TextMessage {
        chat_id,
        user_id,
        username,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_suffix_and_args_from_name() {
        assert_eq!(command_name("/Servers@PanelBot  extra args "), "servers");
        assert_eq!(command_name("/profile"), "profile");
        assert_eq!(command_name("/"), "");
    }

    #[test]
    fn slash_text_is_a_command_keeping_raw_text() {
        let u = classify(ChatId(1), UserId(2), None, "/say hello world");
        match u {
            IncomingUpdate::Command(c) => {
                assert_eq!(c.name, "say");
                assert_eq!(c.text, "/say hello world");
                assert_eq!(c.user_id, UserId(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn plain_and_empty_text_stay_text() {
        for body in ["say hello", ""] {
            match classify(ChatId(1), UserId(2), Some("bob".to_string()), body) {
                IncomingUpdate::Text(t) => {
                    assert_eq!(t.text, body);
                    assert_eq!(t.username.as_deref(), Some("bob"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
