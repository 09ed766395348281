use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use ptb_core::{
    audit::AuditLogger, config::Config, controller::Controller, credentials::CredentialStore,
    messaging::port::MessagingPort, panel::PanelApi,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    panel: Arc<dyn PanelApi>,
    credentials: Arc<dyn CredentialStore>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(bot = %me.username(), title = %cfg.bot_title, "bot started"),
        Err(e) => warn!("get_me failed: {e}"),
    }
    info!(panel = %cfg.panel_url, keys = %cfg.api_keys_file.display(), "panel configured");

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let controller = Controller::new(messenger, panel, credentials, cfg.bot_title.clone())
        .with_audit(AuditLogger::new(
            cfg.audit_log_path.clone(),
            cfg.audit_log_json,
        ));

    let state = Arc::new(AppState {
        controller: Arc::new(controller),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}
