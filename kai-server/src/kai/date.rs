//! Date formatting for the booking site's `tanggal` parameter.

use chrono::{Datelike, NaiveDate};

/// Indonesian month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Format a date the way the booking site expects it.
///
/// The day has no leading zero and the month is spelled out in Indonesian.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use kai_server::kai::format_site_date;
///
/// let date = NaiveDate::from_ymd_opt(2025, 7, 25).unwrap();
/// assert_eq!(format_site_date(date), "25-Juli-2025");
/// ```
pub fn format_site_date(date: NaiveDate) -> String {
    // month0() is always in 0..12
    let month = MONTH_NAMES[date.month0() as usize];
    format!("{}-{}-{}", date.day(), month, date.year())
}
