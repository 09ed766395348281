//! Event routing and the handlers behind every command, button and captured reply.
//!
//! Each handler makes at most one panel call and answers through [`render`]. Panel
//! failures become replies; only transport failures of the reply itself are returned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    audit::{AuditEvent, AuditLogger},
    capture::{CaptureInvocation, CaptureManager, Continuation, CAPTURE_TIMEOUT},
    credentials::{validate_api_key, CredentialStore},
    domain::{ChatId, MessageId, MessageRef, ServerId, UserId},
    formatting as fmt,
    menu::{
        profile_screen, server_actions_screen, server_list_screen, CallbackAction, ServerAction,
    },
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, Command, IncomingUpdate, TextMessage},
    },
    panel::{PanelApi, PanelResult, PowerSignal},
    render::render,
    Result,
};

pub struct Controller {
    messenger: Arc<dyn MessagingPort>,
    panel: Arc<dyn PanelApi>,
    credentials: Arc<dyn CredentialStore>,
    captures: CaptureManager,
    audit: Option<AuditLogger>,
    title: String,
}

impl Controller {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        panel: Arc<dyn PanelApi>,
        credentials: Arc<dyn CredentialStore>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            captures: CaptureManager::new(messenger.clone()),
            messenger,
            panel,
            credentials,
            audit: None,
            title: title.into(),
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Handle one inbound event. An error means the reply itself could not be delivered.
    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        match update {
            IncomingUpdate::Command(cmd) => self.on_command(cmd).await,
            IncomingUpdate::Callback(q) => self.on_callback(q).await,
            IncomingUpdate::Text(msg) => self.on_text(msg).await,
        }
    }

    /// A pending prompt takes any next message, slash-prefixed ones included.
    async fn on_command(&self, cmd: Command) -> Result<()> {
        if let Some(inv) = self
            .captures
            .resolve(cmd.user_id, cmd.chat_id, cmd.text.clone())
            .await
        {
            return self.continue_capture(inv, cmd.username.as_deref()).await;
        }

        info!(
            user_id = cmd.user_id.0,
            chat_id = cmd.chat_id.0,
            command = %cmd.name,
            "command"
        );
        match cmd.name.as_str() {
            "start" => self.reply(cmd.chat_id, &fmt::welcome(&self.title)).await,
            "account" => self.show_account(cmd.chat_id, cmd.user_id).await,
            "profile" => self.show_profile(cmd.chat_id, None, cmd.user_id).await,
            "servers" => self.show_servers(cmd.chat_id, None, cmd.user_id).await,
            other => {
                debug!(command = other, "ignoring unknown command");
                Ok(())
            }
        }
    }

    async fn on_callback(&self, q: CallbackQuery) -> Result<()> {
        let Some(action) = CallbackAction::decode(&q.data) else {
            debug!(user_id = q.user_id.0, data = %q.data, "ignoring unknown callback");
            self.ack(&q.callback_id, None).await;
            return Ok(());
        };
        let Some(msg) = q.message else {
            self.ack(&q.callback_id, None).await;
            return Ok(());
        };
        info!(user_id = q.user_id.0, chat_id = msg.chat_id.0, data = %q.data, "callback");

        let user_id = q.user_id;
        let username = q.username.as_deref();
        let chat_id = msg.chat_id;

        if action != CallbackAction::RemoveApiKey {
            self.ack(&q.callback_id, None).await;
        }

        match action {
            CallbackAction::RemoveApiKey => {
                if let Err(e) = self.credentials.delete(user_id).await {
                    self.ack(&q.callback_id, None).await;
                    return Err(e);
                }
                self.audit(AuditEvent::credential_removed(user_id, username));
                self.ack(&q.callback_id, Some(fmt::API_KEY_REMOVED)).await;
                self.show_profile(chat_id, Some(msg.message_id), user_id)
                    .await
            }
            CallbackAction::AddApiKey => {
                let cont = Continuation::ApiKey { profile: Some(msg) };
                self.prompt(user_id, chat_id, fmt::API_KEY_PROMPT, cont).await
            }
            CallbackAction::BackToServers => {
                self.show_servers(chat_id, Some(msg.message_id), user_id)
                    .await
            }
            CallbackAction::OpenServer(server) => {
                let screen = server_actions_screen(&server);
                render(
                    self.messenger.as_ref(),
                    chat_id,
                    Some(msg.message_id),
                    &screen.text,
                    Some(&screen.keyboard),
                )
                .await
                .map(|_| ())
            }
            CallbackAction::Server(server, action) => match action {
                ServerAction::Info => self.show_server_info(chat_id, user_id, &server).await,
                ServerAction::Resources => {
                    self.show_server_resources(chat_id, user_id, &server)
                        .await
                }
                ServerAction::Power(signal) => {
                    self.power(chat_id, user_id, username, &server, signal)
                        .await
                }
                ServerAction::Command => {
                    let cont = Continuation::ConsoleCommand { server };
                    self.prompt(user_id, chat_id, fmt::COMMAND_PROMPT, cont)
                        .await
                }
                ServerAction::Rename => {
                    let cont = Continuation::Rename { server };
                    self.prompt(user_id, chat_id, fmt::RENAME_PROMPT, cont)
                        .await
                }
            },
        }
    }

    /// Free text only matters when it answers a pending prompt.
    async fn on_text(&self, msg: TextMessage) -> Result<()> {
        let Some(inv) = self
            .captures
            .resolve(msg.user_id, msg.chat_id, msg.text)
            .await
        else {
            debug!(user_id = msg.user_id.0, "ignoring unsolicited text");
            return Ok(());
        };

        self.continue_capture(inv, msg.username.as_deref()).await
    }

    async fn continue_capture(
        &self,
        inv: CaptureInvocation,
        username: Option<&str>,
    ) -> Result<()> {
        match inv.continuation.clone() {
            Continuation::ApiKey { profile } => {
                self.finish_api_key(&inv, username, profile).await
            }
            Continuation::ConsoleCommand { server } => {
                self.finish_command(&inv, username, server).await
            }
            Continuation::Rename { server } => self.finish_rename(&inv, username, server).await,
        }
    }

    async fn finish_api_key(
        &self,
        inv: &CaptureInvocation,
        username: Option<&str>,
        profile: Option<MessageRef>,
    ) -> Result<()> {
        let chat_id = inv.prompt.chat_id;
        let api_key = inv.text.trim();

        if validate_api_key(api_key) {
            self.credentials.put(inv.user_id, api_key).await?;
            self.audit(AuditEvent::credential_added(inv.user_id, username, api_key));
            info!(user_id = inv.user_id.0, "api key stored");
            self.reply(chat_id, fmt::API_KEY_ADDED).await?;
        } else {
            self.audit(AuditEvent::credential_rejected(inv.user_id, username, api_key));
            self.reply(chat_id, fmt::API_KEY_INVALID).await?;
        }

        let existing = profile
            .filter(|p| p.chat_id == chat_id)
            .map(|p| p.message_id);
        self.show_profile(chat_id, existing, inv.user_id).await
    }

    async fn finish_command(
        &self,
        inv: &CaptureInvocation,
        username: Option<&str>,
        server: ServerId,
    ) -> Result<()> {
        let chat_id = inv.prompt.chat_id;
        let command = inv.text.trim();
        if command.is_empty() {
            self.reply(chat_id, fmt::COMMAND_EMPTY).await?;
            let cont = Continuation::ConsoleCommand { server };
            return self
                .prompt(inv.user_id, chat_id, fmt::COMMAND_PROMPT, cont)
                .await;
        }

        let text = match self.credentials.get(inv.user_id).await? {
            None => fmt::NO_API_KEY.to_string(),
            Some(key) => {
                let res = self.panel.send_command(&key, &server, command).await;
                self.record_action(inv.user_id, username, &server, "command", Some(command), &res);
                match res {
                    Ok(()) => fmt::command_sent(command),
                    Err(e) => fmt::command_failed(command, &e),
                }
            }
        };

        self.discard_prompt(inv.prompt).await;
        self.reply(chat_id, &text).await
    }

    async fn finish_rename(
        &self,
        inv: &CaptureInvocation,
        username: Option<&str>,
        server: ServerId,
    ) -> Result<()> {
        let chat_id = inv.prompt.chat_id;
        let name = inv.text.trim();
        if name.is_empty() {
            self.reply(chat_id, fmt::RENAME_EMPTY).await?;
            let cont = Continuation::Rename { server };
            return self
                .prompt(inv.user_id, chat_id, fmt::RENAME_PROMPT, cont)
                .await;
        }

        let text = match self.credentials.get(inv.user_id).await? {
            None => fmt::NO_API_KEY.to_string(),
            Some(key) => {
                let res = self.panel.rename_server(&key, &server, name).await;
                self.record_action(inv.user_id, username, &server, "rename", Some(name), &res);
                match res {
                    Ok(()) => fmt::renamed(name),
                    Err(e) => fmt::panel_failure(fmt::RENAME_FAILED, &e),
                }
            }
        };

        self.discard_prompt(inv.prompt).await;
        self.reply(chat_id, &text).await
    }

    async fn show_profile(
        &self,
        chat_id: ChatId,
        existing: Option<MessageId>,
        user_id: UserId,
    ) -> Result<()> {
        let api_key = self.credentials.get(user_id).await?;
        let screen = profile_screen(user_id, api_key.as_deref());
        render(
            self.messenger.as_ref(),
            chat_id,
            existing,
            &screen.text,
            Some(&screen.keyboard),
        )
        .await
        .map(|_| ())
    }

    async fn show_account(&self, chat_id: ChatId, user_id: UserId) -> Result<()> {
        let Some(key) = self.credentials.get(user_id).await? else {
            return self.reply(chat_id, fmt::NO_API_KEY).await;
        };
        let text = match self.panel.get_account(&key).await {
            Ok(account) => fmt::account(&account),
            Err(e) => fmt::panel_failure(fmt::ACCOUNT_FAILED, &e),
        };
        self.reply(chat_id, &text).await
    }

    /// Server list, fetched fresh on every render.
    async fn show_servers(
        &self,
        chat_id: ChatId,
        existing: Option<MessageId>,
        user_id: UserId,
    ) -> Result<()> {
        let messenger = self.messenger.as_ref();
        let Some(key) = self.credentials.get(user_id).await? else {
            return render(messenger, chat_id, existing, fmt::NO_API_KEY_FOR_SERVERS, None)
                .await
                .map(|_| ());
        };

        match self.panel.list_servers(&key).await {
            Ok(servers) => {
                let screen = server_list_screen(&servers);
                let keyboard = Some(&screen.keyboard);
                render(messenger, chat_id, existing, &screen.text, keyboard).await?;
            }
            Err(e) => {
                let text = fmt::panel_failure(fmt::SERVERS_FAILED, &e);
                render(messenger, chat_id, existing, &text, None).await?;
            }
        }
        Ok(())
    }

    async fn show_server_info(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        server: &ServerId,
    ) -> Result<()> {
        let Some(key) = self.credentials.get(user_id).await? else {
            return self.reply(chat_id, fmt::NO_API_KEY).await;
        };
        let text = match self.panel.get_server(&key, server).await {
            Ok(details) => fmt::server_details(&details),
            Err(e) => fmt::panel_failure(fmt::SERVER_INFO_FAILED, &e),
        };
        self.reply(chat_id, &text).await
    }

    async fn show_server_resources(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        server: &ServerId,
    ) -> Result<()> {
        let Some(key) = self.credentials.get(user_id).await? else {
            return self.reply(chat_id, fmt::NO_API_KEY).await;
        };
        let text = match self.panel.get_server_resources(&key, server).await {
            Ok(res) => fmt::server_resources(&res),
            Err(e) => fmt::panel_failure(fmt::RESOURCES_FAILED, &e),
        };
        self.reply(chat_id, &text).await
    }

    async fn power(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        username: Option<&str>,
        server: &ServerId,
        signal: PowerSignal,
    ) -> Result<()> {
        let Some(key) = self.credentials.get(user_id).await? else {
            return self.reply(chat_id, fmt::NO_API_KEY).await;
        };
        let res = self.panel.send_power(&key, server, signal).await;
        self.record_action(user_id, username, server, signal.as_str(), None, &res);
        let text = match res {
            Ok(()) => fmt::power_done(signal.as_str()),
            Err(e) => fmt::power_failed(signal.as_str(), &e),
        };
        self.reply(chat_id, &text).await
    }

    /// Ask for free text and arm a capture on the prompt message.
    async fn prompt(
        &self,
        user_id: UserId,
        chat_id: ChatId,
        text: &str,
        continuation: Continuation,
    ) -> Result<()> {
        let prompt = render(self.messenger.as_ref(), chat_id, None, text, None).await?;
        self.captures
            .begin(user_id, prompt, continuation, CAPTURE_TIMEOUT)
            .await;
        Ok(())
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<()> {
        render(self.messenger.as_ref(), chat_id, None, text, None)
            .await
            .map(|_| ())
    }

    async fn discard_prompt(&self, prompt: MessageRef) {
        if let Err(e) = self.messenger.delete_message(prompt).await {
            warn!(chat_id = prompt.chat_id.0, "failed to delete prompt: {e}");
        }
    }

    async fn ack(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.messenger.answer_callback_query(callback_id, text).await {
            warn!("failed to answer callback query: {e}");
        }
    }

    /// Log and audit the outcome of a state-changing panel call.
    fn record_action(
        &self,
        user_id: UserId,
        username: Option<&str>,
        server: &ServerId,
        action: &str,
        content: Option<&str>,
        result: &PanelResult<()>,
    ) {
        let outcome = match result {
            Ok(()) => {
                info!(user_id = user_id.0, server_id = %server, action, "panel action done");
                "ok".to_string()
            }
            Err(e) => {
                warn!(
                    user_id = user_id.0,
                    server_id = %server,
                    action,
                    "panel action failed: {e}"
                );
                e.to_string()
            }
        };
        self.audit(AuditEvent::panel_action(
            user_id,
            username,
            server.as_str(),
            action,
            content,
            &outcome,
        ));
    }

    fn audit(&self, event: AuditEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Err(e) = audit.write(event) {
            warn!(path = %audit.path().display(), "failed to write audit event: {e}");
        }
    }
}
