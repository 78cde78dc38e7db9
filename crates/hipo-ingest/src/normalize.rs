//! Normalization from raw CSV rows to [`hipo_core::DeliveryRecord`].
//!
//! Field parsing is delegated to [`crate::parse`]; this module decides what a
//! failed field means for the row as a whole.

use csv::StringRecord;
use hipo_core::{
    CoordinateColumns, DeliveryRecord, Field, Period, QuantityColumn, ResolvedSchema,
};

use crate::error::{IssueKind, ParseIssue};
use crate::parse::{
    parse_combined_coordinates, parse_coordinates, parse_count, parse_date, parse_month,
    parse_year,
};

/// A successfully normalized row plus the warnings raised while degrading
/// its unusable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub record: DeliveryRecord,
    pub issues: Vec<ParseIssue>,
}

/// Normalizes one raw feed row.
///
/// Malformed dates become `None`, malformed coordinates become `None` (the
/// record stays in totals but is never mapped), malformed counts become `0`.
/// Each degradation is reported in [`NormalizedRow::issues`].
///
/// # Errors
///
/// Returns a [`ParseIssue`] with [`IssueKind::MissingLocation`] when the
/// location cell is blank; such a row cannot be attributed to anything.
pub fn normalize_row(
    row: &StringRecord,
    schema: &ResolvedSchema,
    line: usize,
) -> Result<NormalizedRow, ParseIssue> {
    let cell = |idx: usize| row.get(idx).unwrap_or("");
    let issue = |field: Field, value: &str, kind: IssueKind| ParseIssue {
        line,
        field,
        value: value.to_owned(),
        kind,
    };

    let location = cell(schema.location).trim();
    if location.is_empty() {
        return Err(issue(Field::Location, location, IssueKind::MissingLocation));
    }

    let mut issues = Vec::new();

    let raw_date = schema.date.map_or("", cell);
    let date = parse_date(raw_date);
    if date.is_none() && !raw_date.trim().is_empty() {
        issues.push(issue(Field::Date, raw_date, IssueKind::UnparsableDate));
    }

    let period = match date {
        Some(d) => Some(Period::from_date(d)),
        None => split_period(row, schema, &mut issues, line),
    };

    let coordinates = match schema.coordinates {
        CoordinateColumns::Split {
            latitude,
            longitude,
        } => parse_coordinates(cell(latitude), cell(longitude)).map_err(|kind| {
            let raw = format!("{},{}", cell(latitude), cell(longitude));
            issue(Field::Latitude, &raw, kind)
        }),
        CoordinateColumns::Combined(idx) => parse_combined_coordinates(cell(idx))
            .map_err(|kind| issue(Field::Coordinates, cell(idx), kind)),
    };
    let coordinates = match coordinates {
        Ok(c) => Some(c),
        Err(e) => {
            issues.push(e);
            None
        }
    };

    let mut count = |field: Field, idx: Option<usize>| -> u32 {
        let Some(idx) = idx else { return 0 };
        let raw = cell(idx);
        parse_count(raw).unwrap_or_else(|kind| {
            issues.push(issue(field, raw, kind));
            0
        })
    };
    let (boxes, bottles) = match schema.quantity {
        QuantityColumn::Boxes(idx) => (count(Field::Boxes, Some(idx)), None),
        QuantityColumn::Bottles(idx) => (0, Some(count(Field::Bottles, Some(idx)))),
    };
    let remaining_stock = count(Field::RemainingStock, schema.remaining_stock);

    Ok(NormalizedRow {
        record: DeliveryRecord {
            line,
            location: location.to_owned(),
            date,
            period,
            coordinates,
            boxes,
            bottles,
            remaining_stock,
        },
        issues,
    })
}

/// Falls back to the feed's pre-split year/month columns when the date cell
/// is missing or unusable.
fn split_period(
    row: &StringRecord,
    schema: &ResolvedSchema,
    issues: &mut Vec<ParseIssue>,
    line: usize,
) -> Option<Period> {
    let (year_idx, month_idx) = (schema.year?, schema.month?);
    let raw_year = row.get(year_idx).unwrap_or("");
    let raw_month = row.get(month_idx).unwrap_or("");
    if raw_year.trim().is_empty() && raw_month.trim().is_empty() {
        return None;
    }
    match (parse_year(raw_year), parse_month(raw_month)) {
        (Some(year), Some(month)) => Some(Period { year, month }),
        _ => {
            issues.push(ParseIssue {
                line,
                field: Field::Month,
                value: format!("{raw_month}/{raw_year}"),
                kind: IssueKind::UnparsablePeriod,
            });
            None
        }
    }
}
