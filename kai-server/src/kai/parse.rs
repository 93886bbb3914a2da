//! Results page parsing.
//!
//! Pulls ticket cards out of the search results page and keeps only the
//! ones whose stations match the route shown in the page header. The site
//! sometimes mixes in trains from nearby stations.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Placeholder for a field whose element is missing from a card.
pub const MISSING_FIELD: &str = "N/A";

fn selector(css: &str) -> Selector {
    // Only called on the literals below
    Selector::parse(css).expect("static selector is valid CSS")
}

static ORIGIN_INPUT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"input[name="flexdatalist-origination"]"#));
static DESTINATION_INPUT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"input[name="flexdatalist-destination"]"#));
static TICKET_CARD: LazyLock<Selector> =
    LazyLock::new(|| selector("div.data-block.list-kereta"));
static STATION_START: LazyLock<Selector> = LazyLock::new(|| selector("div.station-start"));
static STATION_END: LazyLock<Selector> = LazyLock::new(|| selector("div.station-end"));
static TRAIN_NAME: LazyLock<Selector> = LazyLock::new(|| selector("div.name"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector("div.price"));
static TIME_START: LazyLock<Selector> = LazyLock::new(|| selector("div.time-start"));
static TIME_END: LazyLock<Selector> = LazyLock::new(|| selector("div.time-end"));
static DURATION: LazyLock<Selector> = LazyLock::new(|| selector("div.long-time"));
static SEATS: LazyLock<Selector> = LazyLock::new(|| selector("small.sisa-kursi"));

/// One train offer from the results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Train name and number, e.g. "ARGO BROMO ANGGREK (2)"
    pub train_name: String,
    /// Departure time, "HH:MM"
    pub departure_time: String,
    /// Arrival time, "HH:MM"
    pub arrival_time: String,
    /// Journey duration as displayed, e.g. "8j 55m"
    pub duration: String,
    /// Price as displayed, e.g. "Rp 650.000,-"
    pub price: String,
    /// Seat availability label, e.g. "Tersedia"
    pub status: String,
}

/// A card whose structure could not be read. The card is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("station element .{class} has no text of its own")]
    MissingStationLabel { class: &'static str },
}

/// The route the results page says it is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRoute {
    pub origin: String,
    pub destination: String,
}

/// Whether two station labels overlap: either contains the other,
/// ignoring case. An empty label overlaps everything.
///
/// Heuristic: unrelated stations sharing a substring are accepted, and a
/// renamed station whose labels do not overlap is rejected.
pub fn names_overlap(a: &str, b: &str) -> bool {
    let a = a.to_uppercase();
    let b = b.to_uppercase();
    a.contains(&b) || b.contains(&a)
}

/// Parse a results page into schedule records, in document order.
///
/// Never fails as a whole: cards for other stations are skipped, cards
/// that cannot be read are logged and skipped.
pub fn parse_schedule_page(html: &str) -> Vec<ScheduleRecord> {
    let document = Html::parse_document(html);
    let route = page_route(&document);

    info!(origin = %route.origin, destination = %route.destination, "page header shows route");

    let cards: Vec<ElementRef<'_>> = document.select(&TICKET_CARD).collect();
    info!(count = cards.len(), "found potential ticket cards");

    let mut records = Vec::new();
    for (index, card) in cards.into_iter().enumerate() {
        match parse_card(card, &route) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => error!(card = index, error = %e, "error parsing a ticket card"),
        }
    }

    info!(count = records.len(), "finished parsing valid schedules");
    records
}

/// Read the origin and destination names from the header inputs.
/// Missing inputs read as empty.
fn page_route(document: &Html) -> PageRoute {
    PageRoute {
        origin: input_value(document, &ORIGIN_INPUT),
        destination: input_value(document, &DESTINATION_INPUT),
    }
}

fn input_value(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(|v| v.to_uppercase())
        .unwrap_or_default()
}

/// Parse one card. `Ok(None)` means the card is for a different route.
fn parse_card(card: ElementRef<'_>, route: &PageRoute) -> Result<Option<ScheduleRecord>, CardError> {
    let departure = station_label(card, &STATION_START, "station-start")?;
    let arrival = station_label(card, &STATION_END, "station-end")?;

    if !names_overlap(&departure, &route.origin) {
        warn!(card_origin = %departure, requested_origin = %route.origin, "skipping card, mismatched origin");
        return Ok(None);
    }
    if !names_overlap(&arrival, &route.destination) {
        warn!(
            card_destination = %arrival,
            requested_destination = %route.destination,
            "skipping card, mismatched destination"
        );
        return Ok(None);
    }

    Ok(Some(ScheduleRecord {
        train_name: field(card, &TRAIN_NAME),
        departure_time: field(card, &TIME_START),
        arrival_time: field(card, &TIME_END),
        duration: field(card, &DURATION),
        price: field(card, &PRICE),
        status: field(card, &SEATS),
    }))
}

/// The station label is the element's own first text node, trimmed,
/// ignoring text inside child elements. A blank first node reads as empty,
/// as does a missing element; an element with no text node of its own is
/// a structural error.
fn station_label(
    card: ElementRef<'_>,
    selector: &Selector,
    class: &'static str,
) -> Result<String, CardError> {
    let Some(element) = card.select(selector).next() else {
        return Ok(String::new());
    };

    element
        .children()
        .find_map(|child| child.value().as_text())
        .map(|text| text.trim().to_uppercase())
        .ok_or(CardError::MissingStationLabel { class })
}

/// Text of the first matching element with each text node trimmed,
/// or the placeholder if there is no such element.
fn field(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(stripped_text)
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
