//! Field-level parsers for the raw spreadsheet cells.
//!
//! Every parser is total: bad input yields `None` or an [`IssueKind`], never a
//! panic. The row-level policy (what to null, what to zero, what to report)
//! lives in [`crate::normalize`].

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use hipo_core::Coordinates;
use regex::Regex;

use crate::error::IssueKind;

/// Formats tried after the primary `DD/MM/YYYY` form, in order.
const DATE_FALLBACK_FORMATS: &[&str] =
    &["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%y"];

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const MONTH_NAMES: [&str; 12] = [
    "janeiro", "fevereiro", "marco", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

/// Spreadsheet exports sometimes carry a plausible-looking but wrong year
/// (`"10/01/24"` read with `%Y` is year 24). Anything outside this window is
/// treated as a failed parse so the next format gets a chance.
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

static DAY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b").expect("valid day-first date regex")
});

static ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid ISO date regex")
});

fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    PLAUSIBLE_YEARS.contains(&date.year()).then_some(date)
}

/// Parses a delivery date.
///
/// Tries the spreadsheet's canonical `DD/MM/YYYY` first, then a list of
/// permissive fallbacks (ISO, dashes, dots, two-digit years, date-times,
/// RFC 3339), and finally looks for a date-shaped token inside free text such
/// as `"entregue em 10/01/2024"`. Returns `None` for blank or unparsable input.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = NaiveDate::parse_from_str(s, "%d/%m/%Y").ok().and_then(plausible) {
        return Some(date);
    }

    for fmt in DATE_FALLBACK_FORMATS {
        if let Some(date) = NaiveDate::parse_from_str(s, fmt).ok().and_then(plausible) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            if let Some(date) = plausible(dt.date()) {
                return Some(date);
            }
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return plausible(dt.date_naive());
    }

    find_embedded_date(s)
}

fn find_embedded_date(s: &str) -> Option<NaiveDate> {
    if let Some(caps) = DAY_FIRST_RE.captures(s) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day).and_then(plausible) {
            return Some(date);
        }
    }
    let caps = ISO_RE.captures(s)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).and_then(plausible)
}

/// Parses one coordinate value after discarding everything except digits,
/// `.` and `-`. Stray encoding artifacts such as `"Â"` are dropped.
#[must_use]
pub fn parse_coordinate_part(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Builds validated coordinates from separate latitude/longitude cells.
///
/// # Errors
///
/// - [`IssueKind::MissingCoordinates`] when both cells are blank.
/// - [`IssueKind::UnparsableCoordinates`] when either cell does not parse.
/// - [`IssueKind::CoordinatesOutOfRange`] when the values are not on Earth.
pub fn parse_coordinates(latitude: &str, longitude: &str) -> Result<Coordinates, IssueKind> {
    if latitude.trim().is_empty() && longitude.trim().is_empty() {
        return Err(IssueKind::MissingCoordinates);
    }
    let lat = parse_coordinate_part(latitude).ok_or(IssueKind::UnparsableCoordinates)?;
    let lon = parse_coordinate_part(longitude).ok_or(IssueKind::UnparsableCoordinates)?;
    Coordinates::new(lat, lon).ok_or(IssueKind::CoordinatesOutOfRange)
}

/// Builds validated coordinates from a combined `"lat,lon"` cell. `;` is
/// accepted as the separator as well.
///
/// # Errors
///
/// Same as [`parse_coordinates`]; a cell that does not split into exactly two
/// parts is [`IssueKind::UnparsableCoordinates`].
pub fn parse_combined_coordinates(raw: &str) -> Result<Coordinates, IssueKind> {
    if raw.trim().is_empty() {
        return Err(IssueKind::MissingCoordinates);
    }
    let parts: Vec<&str> = raw.split([',', ';']).collect();
    match parts.as_slice() {
        [lat, lon] => parse_coordinates(lat, lon).map_err(|kind| match kind {
            IssueKind::MissingCoordinates => IssueKind::UnparsableCoordinates,
            other => other,
        }),
        _ => Err(IssueKind::UnparsableCoordinates),
    }
}

/// Coerces a box or stock cell into a non-negative count.
///
/// Blank cells and spreadsheet null markers (`"nan"`, `"-"`) are `Ok(0)`.
/// Fractional values are truncated, as the spreadsheet stores whole units.
///
/// # Errors
///
/// - [`IssueKind::NonNumeric`] when the cell is not a number.
/// - [`IssueKind::NegativeCount`] when the number is below zero.
pub fn parse_count(raw: &str) -> Result<u32, IssueKind> {
    let s = raw.trim();
    if s.is_empty() || s == "-" || s.eq_ignore_ascii_case("nan") {
        return Ok(0);
    }
    let value = s
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(IssueKind::NonNumeric)?;
    if value < 0.0 {
        return Err(IssueKind::NegativeCount);
    }
    // Truncation and saturation at u32::MAX are intended here.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = value.min(f64::from(u32::MAX)) as u32;
    Ok(count)
}

/// Parses a pre-split year cell (`"2024"`, `"2024.0"`).
#[must_use]
pub fn parse_year(raw: &str) -> Option<i32> {
    let count = parse_count(raw).ok().filter(|&v| v > 0)?;
    i32::try_from(count)
        .ok()
        .filter(|y| PLAUSIBLE_YEARS.contains(y))
}

/// Parses a pre-split month cell: `1..=12` or a Portuguese month name
/// (full or three-letter, accents optional).
#[must_use]
pub fn parse_month(raw: &str) -> Option<u32> {
    let s = raw.trim().to_lowercase();
    if let Ok(n) = parse_count(&s) {
        return (1..=12).contains(&n).then_some(n);
    }
    let name: String = s
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'á' | 'â' | 'ã' => 'a',
            'ê' | 'é' => 'e',
            other => other,
        })
        .collect();
    MONTH_NAMES
        .iter()
        .position(|m| *m == name || (name.len() == 3 && m.starts_with(name.as_str())))
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
