//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

/// Query for `GET /stations`.
#[derive(Debug, Deserialize)]
pub struct StationsQuery {
    /// Text to match against station name, code or city
    pub search: Option<String>,
}

/// Query for `GET /search`.
///
/// Every field is optional at the deserialisation level so that a missing
/// parameter can be reported by name.
#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    /// Origin station code, e.g. "GMR"
    pub origin: Option<String>,

    /// Destination station code, e.g. "BD"
    pub destination: Option<String>,

    /// Departure date, YYYY-MM-DD
    pub departure_date: Option<String>,
}

/// Response for `GET /`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub detail: String,
}
