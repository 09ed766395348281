use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{errors::Error, Result};

/// Typed configuration.
///
/// Sources, later wins: optional JSON file (`PANEL_BOT_CONFIG`, default `config.json`,
/// same keys as the legacy bot config), then environment variables (a `.env` file in
/// the working directory is applied first without overriding the real environment).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub bot_title: String,
    /// Panel base URL without trailing slash.
    pub panel_url: String,
    pub api_keys_file: PathBuf,
    pub panel_request_timeout: Duration,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bot_token: Option<String>,
    title: Option<String>,
    panel_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let file_path = env_str("PANEL_BOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.json"));
        let file = read_file_config(&file_path)?;

        Self::from_sources(file, env_str)
    }

    fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = env("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or(file.bot_token.and_then(non_empty))
            .ok_or_else(|| {
                Error::Config(
                    "TELEGRAM_BOT_TOKEN (or bot_token in the config file) is required".to_string(),
                )
            })?;

        let panel_url = env("PANEL_URL")
            .and_then(non_empty)
            .or(file.panel_url.and_then(non_empty))
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .ok_or_else(|| {
                Error::Config("PANEL_URL (or panel_url in the config file) is required".to_string())
            })?;
        if !(panel_url.starts_with("http://") || panel_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "PANEL_URL must start with http:// or https://, got {panel_url}"
            )));
        }

        let bot_title = env("BOT_TITLE")
            .and_then(non_empty)
            .or(file.title.and_then(non_empty))
            .unwrap_or_else(|| "Pterodactyl".to_string());

        let api_keys_file = PathBuf::from(
            env("API_KEYS_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| "apikeys.json".to_string()),
        );

        let panel_request_timeout = Duration::from_secs(
            env("PANEL_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|&s| s > 0)
                .unwrap_or(10),
        );

        let audit_log_path = PathBuf::from(
            env("AUDIT_LOG_PATH").unwrap_or_else(|| "/tmp/panel-bot-audit.log".to_string()),
        );
        let audit_log_json = env("AUDIT_LOG_JSON").map(|s| parse_bool(&s)).unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            bot_title,
            panel_url,
            api_keys_file,
            panel_request_timeout,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    match fs::read_to_string(path) {
        Ok(txt) => serde_json::from_str(&txt).map_err(|e| {
            Error::Config(format!("invalid config file {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(e.into()),
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let Some((key, val)) = parse_dotenv_line(raw) else {
            continue;
        };
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv_line(raw: &str) -> Option<(String, String)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (k, v) = line.split_once('=')?;
    let key = k.trim();
    if key.is_empty() {
        return None;
    }

    let mut val = v.trim();
    // Strip optional surrounding quotes.
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        val = &val[1..val.len() - 1];
    }
    Some((key.to_string(), val.to_string()))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
