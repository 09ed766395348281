//! Append-only audit trail of credential changes and state-changing panel calls.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{credentials::mask_api_key, domain::UserId, errors::Error, Result};

const AUDIT_MAX_TEXT: usize = 500;

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
    pub user_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl AuditEvent {
    fn base(event: &str, user_id: UserId, username: Option<&str>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            user_id: user_id.0,
            username: username.map(|s| s.to_string()),
            key: None,
            server_id: None,
            action: None,
            content: None,
            outcome: None,
        }
    }

    pub fn credential_added(user_id: UserId, username: Option<&str>, api_key: &str) -> Self {
        Self {
            key: Some(mask_api_key(api_key)),
            ..Self::base("credential_added", user_id, username)
        }
    }

    pub fn credential_removed(user_id: UserId, username: Option<&str>) -> Self {
        Self::base("credential_removed", user_id, username)
    }

    /// Input that failed the key shape check. Only its length is recorded.
    pub fn credential_rejected(user_id: UserId, username: Option<&str>, input: &str) -> Self {
        Self {
            content: Some(format!("{} chars", input.chars().count())),
            ..Self::base("credential_rejected", user_id, username)
        }
    }

    pub fn panel_action(
        user_id: UserId,
        username: Option<&str>,
        server_id: &str,
        action: &str,
        content: Option<&str>,
        outcome: &str,
    ) -> Self {
        Self {
            server_id: Some(server_id.to_string()),
            action: Some(action.to_string()),
            content: content.map(|s| s.to_string()),
            outcome: Some(outcome.to_string()),
            ..Self::base("panel_action", user_id, username)
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.content {
            event.content = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}
