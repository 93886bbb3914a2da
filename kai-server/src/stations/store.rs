//! On-disk copy of the station list.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::error::StationError;
use super::model::{Station, validate_stations};

/// Default location of the station file.
pub const DEFAULT_STATIONS_FILE: &str = "stations.json";

/// The persisted station list: a pretty-printed JSON array of
/// `{code, name, city, cityname}` objects.
#[derive(Debug, Clone)]
pub struct StationStore {
    path: PathBuf,
}

impl StationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted list.
    ///
    /// Returns `Ok(None)` if there is no file, and a `DataFormat` error if
    /// the file is not a valid station list.
    pub fn load(&self) -> Result<Option<Vec<Station>>, StationError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StationError::persist(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let payload: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|e| StationError::data_format(format!("invalid JSON: {e}")))?;

        validate_stations(payload).map(Some)
    }

    /// Replace the persisted list.
    ///
    /// Writes a temporary file next to the target and renames it into
    /// place, so readers see either the old list or the new one.
    pub fn save(&self, stations: &[Station]) -> Result<(), StationError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StationError::persist(format!("failed to create directory: {e}"))
            })?;
        }

        let json = serde_json::to_string_pretty(stations)
            .map_err(|e| StationError::persist(format!("failed to serialize stations: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| StationError::persist(format!("failed to create temp file: {e}")))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StationError::persist(format!("failed to write temp file: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            StationError::persist(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for StationStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATIONS_FILE)
    }
}
