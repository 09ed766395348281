//! In-crate fakes for the collaborator ports.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    credentials::CredentialStore,
    domain::{ChatId, MessageId, MessageRef, ServerId, UserId},
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    panel::{
        Account, PanelApi, PanelError, PanelResult, PowerSignal, ServerDetails, ServerResources,
        ServerSummary,
    },
    Error, Result,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    Send {
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Edit {
        msg: MessageRef,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Delete(MessageRef),
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditFailure {
    NotEditable,
    Transport,
}

pub struct FakeMessenger {
    next_id: Mutex<i32>,
    log: Mutex<Vec<Outbound>>,
    edit_failure: Mutex<Option<EditFailure>>,
    supports_edit: bool,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(100),
            log: Mutex::new(Vec::new()),
            edit_failure: Mutex::new(None),
            supports_edit: true,
        }
    }

    pub fn without_edit() -> Self {
        Self {
            supports_edit: false,
            ..Self::new()
        }
    }

    pub fn fail_edits(&self, failure: EditFailure) {
        *self.edit_failure.lock().unwrap() = Some(failure);
    }

    pub fn log(&self) -> Vec<Outbound> {
        self.log.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<MessageRef> {
        self.log()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Delete(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// The id the next `send_text` will hand out.
    pub fn peek_next_id(&self) -> MessageId {
        MessageId(*self.next_id.lock().unwrap())
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: self.supports_edit,
            supports_inline_keyboards: true,
            max_message_len: 4096,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.log.lock().unwrap().push(Outbound::Send {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(self.alloc(chat_id))
    }

    async fn edit_text(
        &self,
        msg: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        match *self.edit_failure.lock().unwrap() {
            Some(EditFailure::NotEditable) => {
                return Err(Error::MessageNotEditable(
                    "message can't be edited".to_string(),
                ))
            }
            Some(EditFailure::Transport) => {
                return Err(Error::External("connection reset".to_string()))
            }
            None => {}
        }
        self.log.lock().unwrap().push(Outbound::Edit {
            msg,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.log.lock().unwrap().push(Outbound::Delete(msg));
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.log.lock().unwrap().push(Outbound::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(|s| s.to_string()),
        });
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PanelCall {
    Account,
    ListServers,
    Server(ServerId),
    Resources(ServerId),
    Power(ServerId, PowerSignal),
    Command(ServerId, String),
    Rename(ServerId, String),
}

/// Scripted panel: each call records itself and returns the configured outcome.
#[derive(Default)]
pub struct FakePanel {
    pub calls: Mutex<Vec<(String, PanelCall)>>,
    pub servers: Mutex<Vec<ServerSummary>>,
    pub account: Mutex<Account>,
    pub details: Mutex<ServerDetails>,
    pub resources: Mutex<ServerResources>,
    /// Failures handed out in order to the next calls; empty means success.
    pub failures: Mutex<VecDeque<PanelError>>,
}

impl FakePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, err: PanelError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> Vec<PanelCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn keys_used(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn record(&self, key: &str, call: PanelCall) -> PanelResult<()> {
        self.calls.lock().unwrap().push((key.to_string(), call));
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PanelApi for FakePanel {
    async fn get_account(&self, key: &str) -> PanelResult<Account> {
        self.record(key, PanelCall::Account)?;
        Ok(self.account.lock().unwrap().clone())
    }

    async fn list_servers(&self, key: &str) -> PanelResult<Vec<ServerSummary>> {
        self.record(key, PanelCall::ListServers)?;
        Ok(self.servers.lock().unwrap().clone())
    }

    async fn get_server(&self, key: &str, id: &ServerId) -> PanelResult<ServerDetails> {
        self.record(key, PanelCall::Server(id.clone()))?;
        Ok(self.details.lock().unwrap().clone())
    }

    async fn get_server_resources(
        &self,
        key: &str,
        id: &ServerId,
    ) -> PanelResult<ServerResources> {
        self.record(key, PanelCall::Resources(id.clone()))?;
        Ok(self.resources.lock().unwrap().clone())
    }

    async fn send_power(&self, key: &str, id: &ServerId, signal: PowerSignal) -> PanelResult<()> {
        self.record(key, PanelCall::Power(id.clone(), signal))
    }

    async fn send_command(&self, key: &str, id: &ServerId, command: &str) -> PanelResult<()> {
        self.record(key, PanelCall::Command(id.clone(), command.to_string()))
    }

    async fn rename_server(&self, key: &str, id: &ServerId, name: &str) -> PanelResult<()> {
        self.record(key, PanelCall::Rename(id.clone(), name.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    keys: Mutex<HashMap<i64, String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `put`/`delete` fail like a full disk.
    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, user_id: UserId) -> Result<Option<String>> {
        Ok(self.keys.lock().unwrap().get(&user_id.0).cloned())
    }

    async fn put(&self, user_id: UserId, api_key: &str) -> Result<()> {
        self.check_writable()?;
        self.keys
            .lock()
            .unwrap()
            .insert(user_id.0, api_key.to_string());
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> Result<()> {
        self.check_writable()?;
        self.keys.lock().unwrap().remove(&user_id.0);
        Ok(())
    }
}

pub fn valid_key() -> String {
    format!("ptlc_{}", "a".repeat(43))
}
