//! Station records and payload validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::StationError;

/// A station as listed by the booking site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// 2-3 letter station code, e.g. "GMR"
    pub code: String,
    /// Station name, e.g. "GAMBIR"
    pub name: String,
    /// City or regency the station is in
    #[serde(default)]
    pub city: String,
    /// Official city/regency name
    #[serde(default)]
    pub cityname: String,
}

impl Station {
    /// Case-insensitive substring match on name, code, city or city name.
    /// `query` must already be lowercase.
    pub(crate) fn matches(&self, query: &str) -> bool {
        [&self.name, &self.code, &self.city, &self.cityname]
            .iter()
            .any(|field| field.to_lowercase().contains(query))
    }
}

/// Check that a payload is a list of objects that each carry a string
/// `code` and `name`, and convert it.
///
/// `city` and `cityname` default to empty when absent.
pub fn validate_stations(payload: Value) -> Result<Vec<Station>, StationError> {
    let Value::Array(items) = payload else {
        return Err(StationError::data_format("expected a JSON array"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            for field in ["code", "name"] {
                if !item.get(field).is_some_and(Value::is_string) {
                    return Err(StationError::data_format(format!(
                        "entry {i} has no string \"{field}\""
                    )));
                }
            }
            serde_json::from_value(item)
                .map_err(|e| StationError::data_format(format!("entry {i}: {e}")))
        })
        .collect()
}
