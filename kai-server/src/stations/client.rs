//! Station list fetch from the booking site.

use tracing::info;

use crate::kai::{BrowserSession, KaiConfig, KaiError};

use super::error::StationError;
use super::model::{Station, validate_stations};

/// Path of the station listing endpoint, relative to the base URL.
const STATIONS_PATH: &str = "/api/stations2";

/// Fetches the station list through a fresh browser session.
#[derive(Debug, Clone)]
pub struct StationClient {
    config: KaiConfig,
}

impl StationClient {
    pub fn new(config: KaiConfig) -> Self {
        Self { config }
    }

    /// URL of the station listing endpoint.
    pub fn stations_url(&self) -> String {
        format!("{}{}", self.config.base_url, STATIONS_PATH)
    }

    /// Fetch and validate all stations.
    pub async fn fetch_all(&self) -> Result<Vec<Station>, StationError> {
        let session = BrowserSession::connect(self.config.clone()).await?;
        let url = self.stations_url();

        info!(url = %url, "fetching latest station list");
        let response = session.post(&url, self.config.timeout()).await?;

        if !response.is_success() {
            return Err(KaiError::UpstreamStatus {
                status: response.status,
                url: response.url,
            }
            .into());
        }

        let payload: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| StationError::data_format(format!("invalid JSON: {e}")))?;

        validate_stations(payload)
    }
}
