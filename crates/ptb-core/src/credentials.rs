//! Per-user panel API keys.

use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{domain::UserId, Result};

pub const API_KEY_PREFIX: &str = "ptlc_";
pub const API_KEY_LEN: usize = 48;

/// Shape check for a client API key: `ptlc_` prefix and exactly 48 characters.
///
/// This is not authentication. A key that passes can still be rejected by the panel,
/// which then surfaces as a status error on the first call that uses it.
pub fn validate_api_key(api_key: &str) -> bool {
    api_key.starts_with(API_KEY_PREFIX) && api_key.chars().count() == API_KEY_LEN
}

/// Loggable form of a key: prefix plus the last four characters.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{API_KEY_PREFIX}…{tail}")
}

/// Durable user id -> API key mapping. At most one key per user.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, user_id: UserId) -> Result<Option<String>>;
    async fn put(&self, user_id: UserId, api_key: &str) -> Result<()>;
    async fn delete(&self, user_id: UserId) -> Result<()>;
}

/// Credential store backed by a JSON object file: `{"<user id>": "<api key>"}`.
///
/// The whole map is kept in memory and the file is rewritten (temp file + rename)
/// on every change.
pub struct JsonFileCredentialStore {
    path: PathBuf,
    keys: Mutex<BTreeMap<String, String>>,
}

impl JsonFileCredentialStore {
    /// Load the store. A missing file means no keys yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let keys = match tokio::fs::read_to_string(&path).await {
            Ok(txt) if txt.trim().is_empty() => BTreeMap::new(),
            Ok(txt) => serde_json::from_str::<BTreeMap<String, String>>(&txt)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "credential file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), users = keys.len(), "credentials loaded");
        Ok(Self {
            path,
            keys: Mutex::new(keys),
        })
    }

    async fn persist(&self, keys: &BTreeMap<String, String>) -> Result<()> {
        let body = serde_json::to_string_pretty(keys)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn get(&self, user_id: UserId) -> Result<Option<String>> {
        Ok(self.keys.lock().await.get(&user_id.0.to_string()).cloned())
    }

    async fn put(&self, user_id: UserId, api_key: &str) -> Result<()> {
        let mut keys = self.keys.lock().await;
        let mut next = keys.clone();
        next.insert(user_id.0.to_string(), api_key.to_string());
        self.persist(&next).await?;
        *keys = next;
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> Result<()> {
        let mut keys = self.keys.lock().await;
        let mut next = keys.clone();
        if next.remove(&user_id.0.to_string()).is_none() {
            return Ok(());
        }
        self.persist(&next).await?;
        *keys = next;
        Ok(())
    }
}
