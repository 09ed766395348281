//! Inline-button menus: callback payloads and the screens they lead to.
//!
//! Every payload carries all the state needed to draw the next screen, so nothing about
//! menu position is kept server-side.

use crate::{
    domain::{ServerId, UserId},
    messaging::types::InlineKeyboard,
    panel::{PowerSignal, ServerSummary},
};

const ADD_API_KEY: &str = "add_api_key";
const REMOVE_API_KEY: &str = "remove_api_key";
const BACK_TO_SERVERS: &str = "back_to_servers";
const SERVER_PREFIX: &str = "server_";

/// Leaf action on one server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerAction {
    Info,
    Resources,
    Power(PowerSignal),
    Command,
    Rename,
}

impl ServerAction {
    /// Button order of the server menu.
    pub const MENU: [(ServerAction, &'static str); 8] = [
        (ServerAction::Info, "Информация"),
        (ServerAction::Resources, "Использование ресурсов"),
        (ServerAction::Power(PowerSignal::Start), "Запуск"),
        (ServerAction::Power(PowerSignal::Restart), "Рестарт"),
        (ServerAction::Power(PowerSignal::Stop), "Выключить"),
        (ServerAction::Power(PowerSignal::Kill), "Сроч. выкл."),
        (ServerAction::Command, "Команда"),
        (ServerAction::Rename, "Переименовать"),
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Resources => "resources",
            Self::Power(sig) => sig.as_str(),
            Self::Command => "command",
            Self::Rename => "rename",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "info" => Some(Self::Info),
            "resources" => Some(Self::Resources),
            "command" => Some(Self::Command),
            "rename" => Some(Self::Rename),
            other => PowerSignal::parse(other).map(Self::Power),
        }
    }
}

/// Decoded button payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    AddApiKey,
    RemoveApiKey,
    BackToServers,
    OpenServer(ServerId),
    Server(ServerId, ServerAction),
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            Self::AddApiKey => ADD_API_KEY.to_string(),
            Self::RemoveApiKey => REMOVE_API_KEY.to_string(),
            Self::BackToServers => BACK_TO_SERVERS.to_string(),
            Self::OpenServer(id) => format!("{SERVER_PREFIX}{id}"),
            Self::Server(id, action) => format!("{SERVER_PREFIX}{id}_{}", action.tag()),
        }
    }

    /// Parse a payload. Unknown or malformed payloads yield `None`.
    pub fn decode(data: &str) -> Option<Self> {
        match data {
            ADD_API_KEY => return Some(Self::AddApiKey),
            REMOVE_API_KEY => return Some(Self::RemoveApiKey),
            BACK_TO_SERVERS => return Some(Self::BackToServers),
            _ => {}
        }

        let rest = data.strip_prefix(SERVER_PREFIX)?;
        let (id, tag) = match rest.split_once('_') {
            Some((id, tag)) => (id, Some(tag)),
            None => (rest, None),
        };
        if id.is_empty() {
            return None;
        }
        let id = ServerId(id.to_string());
        match tag {
            None => Some(Self::OpenServer(id)),
            Some(tag) => ServerAction::from_tag(tag).map(|a| Self::Server(id, a)),
        }
    }
}

/// Text plus buttons of one menu screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub keyboard: InlineKeyboard,
}

pub fn profile_screen(user_id: UserId, api_key: Option<&str>) -> Screen {
    let mut keyboard = InlineKeyboard::default();
    let text = match api_key {
        Some(key) => {
            keyboard.push("Удалить API ключ", CallbackAction::RemoveApiKey.encode());
            format!("Ваш ID: {}\nТекущий API токен: {key}", user_id.0)
        }
        None => {
            keyboard.push("Добавить API ключ", CallbackAction::AddApiKey.encode());
            format!("Ваш ID: {}\nТекущий API токен: Не указан", user_id.0)
        }
    };
    Screen { text, keyboard }
}

/// Server picker. An empty list still renders (with a zero count and no buttons).
pub fn server_list_screen(servers: &[ServerSummary]) -> Screen {
    let mut keyboard = InlineKeyboard::default();
    for server in servers {
        let Some(id) = server.identifier.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let name = server.name.as_deref().unwrap_or("N/A");
        keyboard.push(
            format!("{name} ({id})"),
            CallbackAction::OpenServer(ServerId(id.to_string())).encode(),
        );
    }
    Screen {
        text: format!("Всего доступных серверов: {}\n", servers.len()),
        keyboard,
    }
}

pub fn server_actions_screen(server: &ServerId) -> Screen {
    let mut keyboard = InlineKeyboard::default();
    for (action, label) in ServerAction::MENU {
        keyboard.push(label, CallbackAction::Server(server.clone(), action).encode());
    }
    keyboard.push("Вернуться", CallbackAction::BackToServers.encode());
    Screen {
        text: "Выберите действие:".to_string(),
        keyboard,
    }
}
