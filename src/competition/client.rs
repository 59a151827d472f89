use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::models::{CompetitionDetail, CompetitionSummary};
use crate::config::SyncConfig;
use crate::shared::SyncError;

/// Read access to the ranking service's competition endpoints
#[async_trait]
pub trait CompetitionApi: Send + Sync {
    async fn fetch_competition_list(&self) -> Result<Vec<CompetitionSummary>, SyncError>;
    async fn fetch_competition_detail(&self, id: u64) -> Result<CompetitionDetail, SyncError>;
}

/// HTTP client for the Wise Old Man API
#[derive(Debug, Clone)]
pub struct WomClient {
    client: Client,
    base_url: String,
    group_id: u64,
}

impl WomClient {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            group_id: config.group_id,
        })
    }

    fn list_url(&self) -> String {
        format!("{}/groups/{}/competitions", self.base_url, self.group_id)
    }

    fn detail_url(&self, id: u64) -> String {
        format!("{}/competitions/{}", self.base_url, id)
    }

    async fn get_body(&self, url: &str) -> Result<String, SyncError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::Transport {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|e| SyncError::Transport {
            url: url.to_string(),
            source: e,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SyncError> {
        let body = self.get_body(url).await?;
        serde_json::from_str(&body).map_err(|e| SyncError::MalformedResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CompetitionApi for WomClient {
    /// Entries that do not match the summary shape are skipped, the rest are kept
    #[instrument(skip(self), fields(group_id = self.group_id))]
    async fn fetch_competition_list(&self) -> Result<Vec<CompetitionSummary>, SyncError> {
        let url = self.list_url();
        let raw: Vec<serde_json::Value> = self.get_json(&url).await?;
        let total = raw.len();

        let competitions: Vec<CompetitionSummary> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(index = index, error = %e, "Skipping malformed competition entry");
                    None
                }
            })
            .collect();

        debug!(
            total = total,
            parsed = competitions.len(),
            "Fetched competition list"
        );
        Ok(competitions)
    }

    #[instrument(skip(self))]
    async fn fetch_competition_detail(&self, id: u64) -> Result<CompetitionDetail, SyncError> {
        let detail: CompetitionDetail = self.get_json(&self.detail_url(id)).await?;
        debug!(
            competition_id = id,
            participants = detail.participations.len(),
            "Fetched competition detail"
        );
        Ok(detail)
    }
}
