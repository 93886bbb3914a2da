//! Application state for the web layer.

use std::sync::Arc;

use crate::schedule::ScheduleService;
use crate::stations::StationDirectory;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Schedule search (validation, cache, fetch)
    pub schedules: Arc<ScheduleService>,

    /// Station directory, also reachable through `schedules`
    pub stations: StationDirectory,
}

impl AppState {
    pub fn new(schedules: ScheduleService) -> Self {
        let stations = schedules.stations().clone();
        Self {
            schedules: Arc::new(schedules),
            stations,
        }
    }
}
