//! Panel client API adapter (`/api/client/...`).
//!
//! One request per call, bearer-authenticated with the caller's key. Reads succeed on 200,
//! state-changing calls on 204; anything else is reported as [`PanelError::Status`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use ptb_core::{
    domain::ServerId,
    errors::Error,
    panel::{
        Account, PanelApi, PanelError, PanelResult, PowerSignal, ServerDetails, ServerResources,
        ServerSummary,
    },
    Result,
};

#[derive(Clone, Debug)]
pub struct PanelClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Item<T> {
    attributes: T,
}

#[derive(Deserialize)]
struct List<T> {
    #[serde(default = "Vec::new")]
    data: Vec<Item<T>>,
}

impl PanelClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("panel http client build: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/client{path}", self.base_url)
    }

    fn server_url(&self, id: &ServerId, suffix: &str) -> String {
        self.url(&format!("/servers/{}{suffix}", id.as_str()))
    }

    async fn get<T: DeserializeOwned>(&self, key: &str, url: String) -> PanelResult<T> {
        debug!(%url, "panel GET");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;
        expect_status(resp.status().as_u16(), 200)?;
        resp.json::<T>().await.map_err(transport)
    }

    async fn post(&self, key: &str, url: String, body: serde_json::Value) -> PanelResult<()> {
        debug!(%url, "panel POST");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        expect_status(resp.status().as_u16(), 204)
    }
}

fn transport(e: reqwest::Error) -> PanelError {
    PanelError::Transport(e.to_string())
}

fn expect_status(status: u16, success: u16) -> PanelResult<()> {
    if status == success {
        Ok(())
    } else {
        Err(PanelError::Status(status))
    }
}

#[async_trait]
impl PanelApi for PanelClient {
    async fn get_account(&self, key: &str) -> PanelResult<Account> {
        let item: Item<Account> = self.get(key, self.url("/account")).await?;
        Ok(item.attributes)
    }

    async fn list_servers(&self, key: &str) -> PanelResult<Vec<ServerSummary>> {
        let list: List<ServerSummary> = self.get(key, self.url("")).await?;
        Ok(list.data.into_iter().map(|i| i.attributes).collect())
    }

    async fn get_server(&self, key: &str, id: &ServerId) -> PanelResult<ServerDetails> {
        let item: Item<ServerDetails> = self.get(key, self.server_url(id, "")).await?;
        Ok(item.attributes)
    }

    async fn get_server_resources(
        &self,
        key: &str,
        id: &ServerId,
    ) -> PanelResult<ServerResources> {
        let url = self.server_url(id, "/resources");
        let item: Item<ServerResources> = self.get(key, url).await?;
        Ok(item.attributes)
    }

    async fn send_power(&self, key: &str, id: &ServerId, signal: PowerSignal) -> PanelResult<()> {
        let body = serde_json::json!({ "signal": signal.as_str() });
        self.post(key, self.server_url(id, "/power"), body).await
    }

    async fn send_command(&self, key: &str, id: &ServerId, command: &str) -> PanelResult<()> {
        let body = serde_json::json!({ "command": command });
        self.post(key, self.server_url(id, "/command"), body).await
    }

    async fn rename_server(&self, key: &str, id: &ServerId, name: &str) -> PanelResult<()> {
        let body = serde_json::json!({ "name": name });
        self.post(key, self.server_url(id, "/settings/rename"), body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PanelClient {
        PanelClient::new("https://panel.example.com/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn urls_follow_client_api_layout() {
        let c = client();
        let id = ServerId("abc123".to_string());
        assert_eq!(c.url(""), "https://panel.example.com/api/client");
        assert_eq!(
            c.url("/account"),
            "https://panel.example.com/api/client/account"
        );
        assert_eq!(
            c.server_url(&id, "/settings/rename"),
            "https://panel.example.com/api/client/servers/abc123/settings/rename"
        );
    }

    #[test]
    fn success_status_is_exact() {
        assert_eq!(expect_status(204, 204), Ok(()));
        assert_eq!(expect_status(200, 204), Err(PanelError::Status(200)));
        assert_eq!(expect_status(404, 200), Err(PanelError::Status(404)));
    }

    #[test]
    fn parses_server_list_envelope() {
        let list: List<ServerSummary> = serde_json::from_value(serde_json::json!({
            "object": "list",
            "data": [
                { "object": "server", "attributes": { "identifier": "abc123", "name": "Lobby" } },
                { "object": "server", "attributes": { "identifier": "def456", "name": null } }
            ],
            "meta": { "pagination": { "total": 2 } }
        }))
        .unwrap();
        let names: Vec<_> = list
            .data
            .iter()
            .map(|i| i.attributes.identifier.as_deref())
            .collect();
        assert_eq!(names, vec![Some("abc123"), Some("def456")]);
        assert_eq!(list.data[1].attributes.name, None);
    }

    #[test]
    fn empty_list_without_data_parses() {
        let list: List<ServerSummary> =
            serde_json::from_value(serde_json::json!({ "object": "list" })).unwrap();
        assert!(list.data.is_empty());
    }

    #[test]
    fn parses_resources_envelope() {
        let item: Item<ServerResources> = serde_json::from_value(serde_json::json!({
            "object": "stats",
            "attributes": {
                "current_state": "running",
                "is_suspended": false,
                "resources": {
                    "memory_bytes": 536870912,
                    "cpu_absolute": 12.5,
                    "disk_bytes": 1073741824,
                    "network_rx_bytes": 1,
                    "network_tx_bytes": 2
                }
            }
        }))
        .unwrap();
        assert_eq!(item.attributes.current_state.as_deref(), Some("running"));
        assert_eq!(item.attributes.resources.memory_bytes, 536_870_912);
        assert_eq!(item.attributes.resources.cpu_absolute, 12.5);
    }

    #[test]
    fn parses_account_envelope() {
        let item: Item<Account> = serde_json::from_value(serde_json::json!({
            "object": "user",
            "attributes": {
                "id": 7, "admin": true, "username": "alice",
                "email": "a@example.com", "first_name": "Alice", "last_name": "Smith",
                "language": "en"
            }
        }))
        .unwrap();
        assert_eq!(item.attributes.id, Some(7));
        assert!(item.attributes.admin);
        assert_eq!(item.attributes.username.as_deref(), Some("alice"));
    }
}
