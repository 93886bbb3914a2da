//! Two-step search protocol against the booking site.
//!
//! The site either completes a search synchronously, redirecting straight
//! to `/search`, or answers with an intermediate page carrying a
//! `<meta http-equiv="refresh">` marker that points at the results. Both
//! shapes end with the results page body.

use std::fmt;

use reqwest::Url;
use scraper::{Html, Selector};
use tracing::info;

use super::error::KaiError;
use super::session::BrowserSession;

/// Value of the search form's submit button.
const SUBMIT_LABEL: &str = "Cari+&+Pesan+Tiket";

/// A schedule search as the booking site sees it.
///
/// `date` is already in site format (see [`super::format_site_date`]).
/// Equality is exact on all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub origin: String,
    pub destination: String,
    pub date: String,
}

impl SearchKey {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date: date.into(),
        }
    }

    /// Query parameters for the initial search request.
    pub fn query(&self) -> [(&'static str, &str); 6] {
        [
            ("origination", self.origin.as_str()),
            ("destination", self.destination.as_str()),
            ("tanggal", self.date.as_str()),
            ("adult", "1"),
            ("infant", "0"),
            ("submit", SUBMIT_LABEL),
        ]
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} on {}", self.origin, self.destination, self.date)
    }
}

/// Fetch the results page for a search.
///
/// Step 1 sends the search with redirects followed. If that lands on
/// `{base_url}/search` the body is the result. Otherwise the body must
/// carry a meta refresh marker, whose target is fetched in step 2.
pub async fn fetch_schedule_page(
    session: &BrowserSession,
    key: &SearchKey,
) -> Result<String, KaiError> {
    let config = session.config();
    let timeout = config.timeout();

    info!(
        origin = %key.origin,
        destination = %key.destination,
        date = %key.date,
        "step 1: sending initial search request"
    );
    let first = session
        .get(&config.base_url, &key.query(), true, timeout)
        .await?;

    let results_prefix = format!("{}/search", config.base_url);
    if first.url.starts_with(&results_prefix) {
        info!(url = %first.url, "redirect followed automatically, results page fetched");
        return Ok(first.body);
    }

    let target = extract_refresh_target(&first.body).ok_or(KaiError::RedirectNotFound)?;
    let target = resolve_target(&first.url, &target)?;

    info!(url = %target, "step 2: following refresh marker");
    let second = session.get(&target, &[], true, timeout).await?;

    Ok(second.body)
}

/// Find the target of a `<meta http-equiv="refresh" content="N;url=...">` tag.
///
/// Surrounding quote characters are stripped from the target. Returns
/// `None` when no refresh tag with a `url=` part exists.
pub fn extract_refresh_target(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta[http-equiv]").ok()?;

    let content = document
        .select(&selector)
        .find(|meta| {
            meta.value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
        })?
        .value()
        .attr("content")?;

    let start = content.to_ascii_lowercase().find("url=")? + "url=".len();
    let target = content[start..]
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim();

    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// Resolve a possibly relative refresh target against the page it came from.
fn resolve_target(page_url: &str, target: &str) -> Result<String, KaiError> {
    if let Ok(absolute) = Url::parse(target) {
        return Ok(absolute.to_string());
    }

    Url::parse(page_url)
        .and_then(|base| base.join(target))
        .map(|u| u.to_string())
        .map_err(|_| KaiError::InvalidRedirect(target.to_string()))
}
