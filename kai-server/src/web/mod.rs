//! Web layer.
//!
//! Thin HTTP surface over the schedule service and station directory.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
