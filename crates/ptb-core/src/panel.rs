//! Panel API port and the payload fields the bot reads.
//!
//! The client adapter lives in `ptb-panel`; the controller only sees this trait.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::ServerId;

/// Failure of a single panel call. Never retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Any status other than the one the endpoint documents as success.
    #[error("panel returned status {0}")]
    Status(u16),

    /// The request never produced a status (DNS, TLS, timeout, bad body...).
    #[error("panel request failed: {0}")]
    Transport(String),
}

pub type PanelResult<T> = std::result::Result<T, PanelError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerSignal {
    Start,
    Restart,
    Stop,
    Kill,
}

impl PowerSignal {
    pub const ALL: [PowerSignal; 4] = [Self::Start, Self::Restart, Self::Stop, Self::Kill];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Restart => "restart",
            Self::Stop => "stop",
            Self::Kill => "kill",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sig| sig.as_str() == s)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: Option<i64>,
    pub admin: bool,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerSummary {
    pub identifier: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerLimits {
    pub cpu: Option<i64>,
    pub memory: Option<i64>,
    pub disk: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeatureLimits {
    pub databases: Option<i64>,
    pub allocations: Option<i64>,
    pub backups: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SftpDetails {
    pub ip: Option<String>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerDetails {
    pub name: Option<String>,
    pub server_owner: bool,
    pub uuid: Option<String>,
    pub description: Option<String>,
    pub limits: ServerLimits,
    pub feature_limits: FeatureLimits,
    pub sftp_details: SftpDetails,
    pub node: Option<String>,
    pub is_suspended: bool,
    pub is_installing: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResourceUsage {
    pub memory_bytes: u64,
    pub disk_bytes: u64,
    pub cpu_absolute: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerResources {
    pub current_state: Option<String>,
    pub resources: ResourceUsage,
}

/// Authenticated panel operations, one HTTP call each.
#[async_trait]
pub trait PanelApi: Send + Sync {
    async fn get_account(&self, key: &str) -> PanelResult<Account>;
    async fn list_servers(&self, key: &str) -> PanelResult<Vec<ServerSummary>>;
    async fn get_server(&self, key: &str, id: &ServerId) -> PanelResult<ServerDetails>;
    async fn get_server_resources(&self, key: &str, id: &ServerId)
        -> PanelResult<ServerResources>;
    async fn send_power(&self, key: &str, id: &ServerId, signal: PowerSignal) -> PanelResult<()>;
    async fn send_command(&self, key: &str, id: &ServerId, command: &str) -> PanelResult<()>;
    async fn rename_server(&self, key: &str, id: &ServerId, name: &str) -> PanelResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_signal_round_trips_names() {
        for sig in PowerSignal::ALL {
            assert_eq!(PowerSignal::parse(sig.as_str()), Some(sig));
        }
        assert_eq!(PowerSignal::parse("reboot"), None);
    }

    #[test]
    fn details_tolerate_missing_and_null_fields() {
        let d: ServerDetails = serde_json::from_value(serde_json::json!({
            "name": "lobby",
            "limits": { "cpu": 200, "memory": null },
            "sftp_details": { "ip": "10.0.0.2", "port": 2022 }
        }))
        .unwrap();
        assert_eq!(d.name.as_deref(), Some("lobby"));
        assert_eq!(d.limits.cpu, Some(200));
        assert_eq!(d.limits.memory, None);
        assert_eq!(d.sftp_details.port, Some(2022));
        assert!(!d.is_suspended);
    }
}
