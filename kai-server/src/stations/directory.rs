//! Shared station directory.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use super::client::StationClient;
use super::error::StationError;
use super::model::Station;
use super::store::StationStore;

/// An immutable station list with its code index.
#[derive(Debug, Default)]
pub struct StationSnapshot {
    stations: Vec<Station>,
    codes: HashSet<String>,
}

impl StationSnapshot {
    pub fn new(stations: Vec<Station>) -> Self {
        let codes = stations.iter().map(|s| s.code.to_uppercase()).collect();
        Self { stations, codes }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Case-insensitive code lookup.
    pub fn contains_code(&self, code: &str) -> bool {
        self.codes.contains(&code.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Thread-safe station directory.
///
/// Readers take a cheap clone of the current snapshot. [`refresh`] is the
/// only writer: it builds a complete new snapshot and swaps it in, so a
/// reader never sees a list and index from different generations.
/// Concurrent refreshes run one at a time so the file and the published
/// snapshot always come from the same fetch.
///
/// [`refresh`]: StationDirectory::refresh
#[derive(Clone)]
pub struct StationDirectory {
    inner: Arc<RwLock<Arc<StationSnapshot>>>,
    refresh_lock: Arc<Mutex<()>>,
    client: StationClient,
    store: StationStore,
}

impl StationDirectory {
    /// Load the directory from the store, fetching from the site if the
    /// file is missing or unusable.
    pub async fn load(client: StationClient, store: StationStore) -> Result<Self, StationError> {
        let directory = Self::empty(client, store);

        match directory.store.load() {
            Ok(Some(stations)) => {
                info!(count = stations.len(), path = %directory.store.path().display(), "loaded stations from file");
                directory.replace(stations).await;
            }
            Ok(None) => {
                warn!(path = %directory.store.path().display(), "station file not found, fetching it now");
                directory.refresh().await?;
            }
            Err(e) => {
                error!(error = %e, "failed to load station file, refetching");
                directory.refresh().await?;
            }
        }

        Ok(directory)
    }

    /// Create an empty directory without touching the store or the site.
    pub fn empty(client: StationClient, store: StationStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(StationSnapshot::default()))),
            refresh_lock: Arc::new(Mutex::new(())),
            client,
            store,
        }
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<StationSnapshot> {
        Arc::clone(&*self.inner.read().await)
    }

    /// Whether `code` is a known station code, ignoring case.
    pub async fn is_valid(&self, code: &str) -> bool {
        self.snapshot().await.contains_code(code)
    }

    /// Stations whose name, code, city or city name contains `query`,
    /// ignoring case.
    pub async fn search(&self, query: &str) -> Vec<Station> {
        let query = query.to_lowercase();
        self.snapshot()
            .await
            .stations()
            .iter()
            .filter(|s| s.matches(&query))
            .cloned()
            .collect()
    }

    /// Every known station.
    pub async fn all(&self) -> Vec<Station> {
        self.snapshot().await.stations().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshot().await.is_empty()
    }

    /// Fetch the current list from the site, persist it and publish it.
    ///
    /// On any failure the previous list, index and file are left as they
    /// were and the error is returned.
    pub async fn refresh(&self) -> Result<usize, StationError> {
        let _guard = self.refresh_lock.lock().await;

        let stations = self.client.fetch_all().await?;
        self.store.save(&stations)?;

        let count = stations.len();
        self.replace(stations).await;

        info!(count, "updated and saved station list");
        Ok(count)
    }

    async fn replace(&self, stations: Vec<Station>) {
        let snapshot = Arc::new(StationSnapshot::new(stations));
        *self.inner.write().await = snapshot;
    }
}
