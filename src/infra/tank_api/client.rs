use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::debug;

use crate::fetch::{HttpClient, client_with_token, fetch_bytes};
use crate::parser::parse_history;
use crate::reading::RawReading;
use crate::services::history_api::HistoryApi;

/// REST client for the dashboard backend's `GET /tanks/{id}/history`.
pub struct TankApiClient {
    base_url: String,
    http: Box<dyn HttpClient>,
}

impl TankApiClient {
    /// Builds a client against `base_url`, authenticating with `token` as a
    /// bearer credential when one is given.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        Ok(Self::with_client(base_url, client_with_token(token)?))
    }

    /// Uses a caller-provided transport.
    pub fn with_client(base_url: &str, http: Box<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn history_url(&self, tank_id: &str) -> Result<String> {
        let valid = !tank_id.is_empty()
            && tank_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("invalid tank id '{}'", tank_id);
        }
        Ok(format!("{}/tanks/{}/history", self.base_url, tank_id))
    }
}

#[async_trait]
impl HistoryApi for TankApiClient {
    async fn tank_history(&self, tank_id: &str) -> Result<Vec<RawReading>> {
        let url = self.history_url(tank_id)?;
        let bytes = fetch_bytes(self.http.as_ref(), &url)
            .await
            .with_context(|| format!("failed to fetch history for tank {tank_id}"))?;
        debug!(tank_id, bytes = bytes.len(), "History payload received");

        parse_history(&bytes).with_context(|| format!("failed to parse history for tank {tank_id}"))
    }
}
