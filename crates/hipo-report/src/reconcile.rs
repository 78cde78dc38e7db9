//! Last valid remaining stock per location.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use hipo_core::{Coordinates, DeliveryRecord, Period, StockPolicy};
use serde::Serialize;

use crate::filter::FilterSpec;
use crate::markers::MapMarker;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRow {
    pub location: String,
    pub remaining_stock: u32,
    /// Date of the declaring record; `None` for an undated declaration.
    pub declared_on: Option<NaiveDate>,
    pub period: Option<Period>,
    pub coordinates: Option<Coordinates>,
    /// Source line of the declaring record.
    pub line: usize,
}

/// At most one row per location, ordered by location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockTable {
    pub rows: Vec<StockRow>,
}

impl StockTable {
    /// Valid remaining stock for `location`; 0 when none is reported.
    #[must_use]
    pub fn stock_for(&self, location: &str) -> u32 {
        self.rows
            .iter()
            .find(|r| r.location == location)
            .map_or(0, |r| r.remaining_stock)
    }

    #[must_use]
    pub fn markers(&self) -> Vec<MapMarker> {
        self.rows
            .iter()
            .filter_map(|row| Some(MapMarker::stock(row, row.coordinates?)))
            .collect()
    }
}

/// Picks the stock figure still valid for each location among the records
/// matching `filter`.
#[must_use]
pub fn reconcile_stock(
    records: &[DeliveryRecord],
    filter: &FilterSpec,
    policy: StockPolicy,
) -> StockTable {
    let mut by_location: BTreeMap<&str, Vec<&DeliveryRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| filter.matches(r)) {
        by_location
            .entry(record.location.as_str())
            .or_default()
            .push(record);
    }

    let mut rows = Vec::new();
    for (location, mut history) in by_location {
        // Undated first; equal dates keep source order.
        history.sort_by_key(|r| (r.date, r.line));

        let Some(chosen) = select(&history, policy) else {
            tracing::trace!(location, %policy, "no valid stock");
            continue;
        };
        rows.push(StockRow {
            location: location.to_owned(),
            remaining_stock: chosen.remaining_stock,
            declared_on: chosen.date,
            period: chosen.period,
            coordinates: chosen.coordinates,
            line: chosen.line,
        });
    }

    tracing::debug!(locations = rows.len(), %policy, "reconciled stock");
    StockTable { rows }
}

/// `history` is sorted ascending by `(date, line)`.
fn select<'a>(history: &[&'a DeliveryRecord], policy: StockPolicy) -> Option<&'a DeliveryRecord> {
    match policy {
        StockPolicy::SuppressStale => {
            // Rows sharing the latest date form the current snapshot. Anything
            // older has been superseded, whether by a delivery or a report of
            // exhausted stock.
            let last_date = history.last()?.date;
            history
                .iter()
                .rev()
                .take_while(|r| r.date == last_date)
                .find(|r| r.is_stock_declaration())
                .copied()
        }
        StockPolicy::LatestRecord => history
            .last()
            .copied()
            .filter(|r| r.is_stock_declaration()),
        StockPolicy::RequireDelivery => history
            .last()
            .copied()
            .filter(|r| r.is_stock_declaration() && r.is_delivery()),
        StockPolicy::DeclarationOnly => history
            .last()
            .copied()
            .filter(|r| r.is_pure_stock_declaration()),
    }
}
