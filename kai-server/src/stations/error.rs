//! Station directory error types.

use crate::kai::KaiError;

/// Errors that can occur when loading or refreshing the station list.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// The booking site could not be reached or refused the request
    #[error("station fetch failed: {0}")]
    Fetch(#[from] KaiError),

    /// The payload was not a list of station objects
    #[error("unexpected station data format: {message}")]
    DataFormat { message: String },

    /// Reading or writing the station file failed
    #[error("station file error: {message}")]
    Persist { message: String },
}

impl StationError {
    pub(crate) fn data_format(message: impl Into<String>) -> Self {
        StationError::DataFormat {
            message: message.into(),
        }
    }

    pub(crate) fn persist(message: impl Into<String>) -> Self {
        StationError::Persist {
            message: message.into(),
        }
    }
}
