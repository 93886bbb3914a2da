//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::kai::ScheduleRecord;
use crate::schedule::SearchError;
use crate::stations::Station;

use super::dto::*;
use super::state::AppState;

/// Message returned for any failure that is not the caller's fault.
const INTERNAL_ERROR_MESSAGE: &str = "An unexpected internal server error occurred.";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/stations", get(list_stations))
        .route("/search", get(search_schedules))
        .with_state(state)
}

/// Service status.
async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "KAI Ticket Checker API is running!",
    })
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All stations, or those matching `?search=`.
async fn list_stations(
    State(state): State<AppState>,
    Query(query): Query<StationsQuery>,
) -> Json<Vec<Station>> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let stations = match search {
        Some(q) => {
            info!(query = q, "searching for stations");
            state.stations.search(q).await
        }
        None => {
            info!("fetching all stations");
            state.stations.all().await
        }
    };

    Json(stations)
}

/// Search train schedules for a route and date.
async fn search_schedules(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<ScheduleRecord>>, AppError> {
    let origin = required(query.origin, "origin")?;
    let destination = required(query.destination, "destination")?;
    let raw_date = required(query.departure_date, "departure_date")?;

    let date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest {
            message: format!("Invalid departure_date: '{raw_date}'. Expected YYYY-MM-DD."),
        }
    })?;

    info!(%origin, %destination, %date, "search requested");
    let records = state
        .schedules
        .search(&origin, &destination, date)
        .await?;

    if records.is_empty() {
        return Err(AppError::NotFound {
            message: format!(
                "No schedules found for route {} to {} on {}.",
                origin.to_uppercase(),
                destination.to_uppercase(),
                date
            ),
        });
    }

    Ok(Json(records.to_vec()))
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest {
            message: format!("Missing required query parameter: {name}"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    /// `message` is logged, never sent to the client
    Internal { message: String },
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidOrigin(_) | SearchError::InvalidDestination(_) => {
                AppError::BadRequest {
                    message: format!("{e}. Use the /stations endpoint to find valid codes."),
                }
            }
            SearchError::SameStation => AppError::BadRequest {
                message: e.to_string(),
            },
            SearchError::Upstream(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => {
                warn!(%message, "rejected request");
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::NotFound { message } => {
                warn!(%message, "nothing found");
                (StatusCode::NOT_FOUND, message)
            }
            AppError::Internal { message } => {
                error!(%message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}
