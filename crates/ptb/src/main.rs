use std::sync::Arc;

use ptb_core::{config::Config, credentials::JsonFileCredentialStore};
use ptb_panel::PanelClient;

#[tokio::main]
async fn main() -> Result<(), ptb_core::Error> {
    ptb_core::logging::init("ptb")?;

    let cfg = Arc::new(Config::load()?);

    let panel = Arc::new(PanelClient::new(
        cfg.panel_url.clone(),
        cfg.panel_request_timeout,
    )?);
    let credentials = Arc::new(JsonFileCredentialStore::open(cfg.api_keys_file.clone()).await?);
    tracing::info!(audit_log = %cfg.audit_log_path.display(), "starting");

    ptb_telegram::router::run_polling(cfg, panel, credentials)
        .await
        .map_err(|e| ptb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
