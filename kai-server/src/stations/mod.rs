//! Station directory.
//!
//! Holds the list of valid station codes used to vet searches before any
//! request reaches the booking site. The list is persisted to a JSON file,
//! loaded at startup (fetched if the file is missing or corrupt) and
//! refreshed from `/api/stations2` on a fixed interval.

mod client;
mod directory;
mod error;
mod model;
mod store;

pub use client::StationClient;
pub use directory::{StationDirectory, StationSnapshot};
pub use error::StationError;
pub use model::{Station, validate_stations};
pub use store::{DEFAULT_STATIONS_FILE, StationStore};
