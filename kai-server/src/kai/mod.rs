//! Booking site client.
//!
//! Everything that knows about the shape of booking.kai.id lives here:
//! the browser-like session, the two-step search protocol, the results
//! page parser and the site's date format.
//!
//! Nothing here retries. Transport failures surface as
//! [`KaiError::Network`] and markup drift as [`KaiError::RedirectNotFound`]
//! or as cards being skipped by the parser.

mod date;
mod error;
mod fetch;
mod parse;
mod session;

pub use date::{MONTH_NAMES, format_site_date};
pub use error::KaiError;
pub use fetch::{SearchKey, extract_refresh_target, fetch_schedule_page};
pub use parse::{CardError, MISSING_FIELD, PageRoute, ScheduleRecord, names_overlap, parse_schedule_page};
pub use session::{BrowserSession, DEFAULT_BASE_URL, KaiConfig, RawResponse};
