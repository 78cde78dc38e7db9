//! Per-location delivery totals.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use hipo_core::{Coordinates, DeliveryRecord, Period};
use serde::Serialize;

use crate::filter::FilterSpec;
use crate::markers::MapMarker;

/// Label of the synthetic grand-total row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// First and last month a group received a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub first: Period,
    pub last: Period,
}

impl PeriodRange {
    fn single(period: Period) -> Self {
        Self {
            first: period,
            last: period,
        }
    }

    fn extend(&mut self, period: Period) {
        self.first = self.first.min(period);
        self.last = self.last.max(period);
    }

    fn merge(self, other: Self) -> Self {
        Self {
            first: self.first.min(other.first),
            last: self.last.max(other.last),
        }
    }
}

impl std::fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{} a {}", self.first, self.last)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRow {
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub period: Option<PeriodRange>,
    pub deliveries: usize,
    pub boxes: u64,
    pub bottles: u64,
    /// Set only on the trailing grand-total row.
    pub is_total: bool,
}

/// Delivery groups ordered by location then coordinates, followed by one
/// `TOTAL` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryTable {
    pub rows: Vec<DeliveryRow>,
}

impl DeliveryTable {
    /// Rows excluding the grand total.
    pub fn groups(&self) -> impl Iterator<Item = &DeliveryRow> {
        self.rows.iter().filter(|r| !r.is_total)
    }

    /// The synthetic grand-total row.
    #[must_use]
    pub fn total(&self) -> Option<&DeliveryRow> {
        self.rows.iter().find(|r| r.is_total)
    }

    /// Bottles delivered to `location`, summed over its coordinate groups.
    #[must_use]
    pub fn bottles_for(&self, location: &str) -> u64 {
        self.groups()
            .filter(|r| r.location == location)
            .map(|r| r.bottles)
            .sum()
    }

    /// One marker per mappable group.
    #[must_use]
    pub fn markers(&self) -> Vec<MapMarker> {
        self.groups()
            .filter_map(|row| {
                let coordinates = row.coordinates?;
                Some(MapMarker::delivery(row, coordinates))
            })
            .collect()
    }
}

/// `BTreeMap` key giving a total order over `(location, coordinates)`.
#[derive(Debug, Clone, PartialEq)]
struct GroupKey {
    location: String,
    coordinates: Option<Coordinates>,
}

impl Eq for GroupKey {}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.location
            .cmp(&other.location)
            .then_with(|| match (&self.coordinates, &other.coordinates) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.total_cmp(b),
            })
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct GroupTotals {
    period: PeriodRange,
    deliveries: usize,
    boxes: u64,
    bottles: u64,
}

/// Sums delivered boxes and bottles per `(location, coordinates)` over the
/// records matching `filter`.
///
/// Only delivery events with a known period contribute. The result does not
/// depend on input order.
#[must_use]
pub fn aggregate_deliveries(records: &[DeliveryRecord], filter: &FilterSpec) -> DeliveryTable {
    let mut groups: BTreeMap<GroupKey, GroupTotals> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| r.is_delivery() && filter.matches(r))
    {
        let Some(period) = record.period else {
            continue;
        };
        let key = GroupKey {
            location: record.location.clone(),
            coordinates: record.coordinates,
        };
        let totals = groups.entry(key).or_insert_with(|| GroupTotals {
            period: PeriodRange::single(period),
            deliveries: 0,
            boxes: 0,
            bottles: 0,
        });
        totals.period.extend(period);
        totals.deliveries += 1;
        totals.boxes += u64::from(record.boxes);
        totals.bottles += record.bottles_delivered();
    }

    let mut rows: Vec<DeliveryRow> = groups
        .into_iter()
        .map(|(key, totals)| DeliveryRow {
            location: key.location,
            coordinates: key.coordinates,
            period: Some(totals.period),
            deliveries: totals.deliveries,
            boxes: totals.boxes,
            bottles: totals.bottles,
            is_total: false,
        })
        .collect();

    let total = DeliveryRow {
        location: TOTAL_LABEL.to_owned(),
        coordinates: None,
        period: rows
            .iter()
            .filter_map(|r| r.period)
            .reduce(PeriodRange::merge),
        deliveries: rows.iter().map(|r| r.deliveries).sum(),
        boxes: rows.iter().map(|r| r.boxes).sum(),
        bottles: rows.iter().map(|r| r.bottles).sum(),
        is_total: true,
    };
    tracing::debug!(
        groups = rows.len(),
        bottles = total.bottles,
        "aggregated deliveries"
    );
    rows.push(total);

    DeliveryTable { rows }
}
