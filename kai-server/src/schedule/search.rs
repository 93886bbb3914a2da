//! The search operation and its errors.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::cache::{CachedRecords, ResultCache};
use crate::kai::{
    BrowserSession, KaiConfig, KaiError, ScheduleRecord, SearchKey, fetch_schedule_page,
    format_site_date, parse_schedule_page,
};
use crate::stations::StationDirectory;

/// Why a search could not be performed.
///
/// An empty result is not an error: it is `Ok` with no records.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid origin station code: '{0}'")]
    InvalidOrigin(String),

    #[error("invalid destination station code: '{0}'")]
    InvalidDestination(String),

    #[error("origin and destination cannot be the same")]
    SameStation,

    /// Fetching or reading the results page failed
    #[error(transparent)]
    Upstream(#[from] KaiError),
}

impl SearchError {
    /// Whether the caller's input was at fault.
    pub fn is_validation(&self) -> bool {
        !matches!(self, SearchError::Upstream(_))
    }
}

/// Schedule search service.
///
/// Shared by all request handlers. Each cache miss opens its own
/// [`BrowserSession`], so concurrent searches never share cookie state.
pub struct ScheduleService {
    config: KaiConfig,
    cache: ResultCache,
    stations: StationDirectory,
}

impl ScheduleService {
    pub fn new(config: KaiConfig, cache: ResultCache, stations: StationDirectory) -> Self {
        Self {
            config,
            cache,
            stations,
        }
    }

    /// Search for trains from `origin` to `destination` on `date`.
    ///
    /// Station codes are checked before anything touches the network:
    /// origin first, then destination, then that they differ.
    pub async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<CachedRecords, SearchError> {
        let (origin, destination) = self.validate(origin, destination).await?;
        let key = SearchKey::new(origin, destination, format_site_date(date));

        if let Some(cached) = self.cache.get(&key).await {
            info!(search = %key, count = cached.len(), "serving schedules from cache");
            return Ok(cached);
        }

        let records = Arc::new(self.fetch(&key).await?);
        if records.is_empty() {
            warn!(search = %key, "no valid schedules found");
        } else {
            info!(search = %key, count = records.len(), "found schedules");
        }

        self.cache.put(key, Arc::clone(&records)).await;
        Ok(records)
    }

    /// Normalise and check a pair of station codes.
    ///
    /// Returns the uppercased codes.
    pub async fn validate(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<(String, String), SearchError> {
        let snapshot = self.stations.snapshot().await;
        let origin = origin.trim().to_uppercase();
        let destination = destination.trim().to_uppercase();

        if !snapshot.contains_code(&origin) {
            return Err(SearchError::InvalidOrigin(origin));
        }
        if !snapshot.contains_code(&destination) {
            return Err(SearchError::InvalidDestination(destination));
        }
        if origin == destination {
            return Err(SearchError::SameStation);
        }

        Ok((origin, destination))
    }

    async fn fetch(&self, key: &SearchKey) -> Result<Vec<ScheduleRecord>, KaiError> {
        let session = BrowserSession::connect(self.config.clone()).await?;
        let html = fetch_schedule_page(&session, key).await?;
        Ok(parse_schedule_page(&html))
    }

    pub(crate) fn stations(&self) -> &StationDirectory {
        &self.stations
    }
}
