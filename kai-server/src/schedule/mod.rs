//! Schedule search.
//!
//! Validates a search against the station directory, then answers it from
//! the result cache or by running the fetch-and-parse pipeline against the
//! booking site.

mod search;

#[cfg(test)]
mod search_tests;

pub use search::{ScheduleService, SearchError};
