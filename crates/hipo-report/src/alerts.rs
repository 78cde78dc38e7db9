//! Locations overdue for a delivery.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use hipo_core::DeliveryRecord;
use serde::Serialize;

pub const DEFAULT_ALERT_THRESHOLD_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRow {
    pub location: String,
    pub days_since_last_delivery: i64,
    pub last_delivery: NaiveDate,
}

/// Flags every location whose most recent dated delivery is more than
/// `threshold_days` whole days before `now`.
///
/// Locations that never received a delivery are not flagged. Rows are ordered
/// by days since delivery (descending), then location.
#[must_use]
pub fn evaluate_alerts(
    records: &[DeliveryRecord],
    now: DateTime<Utc>,
    threshold_days: i64,
) -> Vec<AlertRow> {
    let mut last_delivery: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_delivery()) {
        let Some(date) = record.date else {
            continue;
        };
        last_delivery
            .entry(record.location.as_str())
            .and_modify(|d| *d = (*d).max(date))
            .or_insert(date);
    }

    let mut alerts: Vec<AlertRow> = last_delivery
        .into_iter()
        .filter_map(|(location, date)| {
            let days = (now - date.and_time(chrono::NaiveTime::MIN).and_utc()).num_days();
            (days > threshold_days).then(|| AlertRow {
                location: location.to_owned(),
                days_since_last_delivery: days,
                last_delivery: date,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.days_since_last_delivery
            .cmp(&a.days_since_last_delivery)
            .then_with(|| a.location.cmp(&b.location))
    });
    tracing::debug!(alerts = alerts.len(), threshold_days, "evaluated delivery alerts");
    alerts
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use hipo_core::{Coordinates, Period};

    use super::*;

    fn rec(location: &str, ymd: (i32, u32, u32), boxes: u32, stock: u32) -> DeliveryRecord {
        let date = NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2);
        DeliveryRecord {
            line: 2,
            location: location.to_owned(),
            date,
            period: date.map(Period::from_date),
            coordinates: Coordinates::new(-7.2, -39.3),
            boxes,
            bottles: None,
            remaining_stock: stock,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 16, 15, 30, 0).unwrap()
    }

    #[test]
    fn flags_location_past_threshold() {
        // 2024-01-31 00:00 to 2024-03-16 15:30 is 45 whole days.
        let records = vec![rec("Crato", (2024, 1, 31), 1, 0)];
        let alerts = evaluate_alerts(&records, now(), 30);
        assert_eq!(
            alerts,
            vec![AlertRow {
                location: "Crato".to_owned(),
                days_since_last_delivery: 45,
                last_delivery: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            }]
        );
    }

    #[test]
    fn exactly_threshold_days_is_not_flagged() {
        let records = vec![rec("Crato", (2024, 2, 15), 1, 0)];
        assert!(evaluate_alerts(&records, now(), 30).is_empty());
        assert_eq!(evaluate_alerts(&records, now(), 29).len(), 1);
    }

    #[test]
    fn uses_latest_delivery_per_location() {
        let records = vec![
            rec("Crato", (2023, 11, 1), 1, 0),
            rec("Crato", (2024, 3, 10), 1, 0),
        ];
        assert!(evaluate_alerts(&records, now(), 30).is_empty());
    }

    #[test]
    fn stock_only_locations_are_never_flagged() {
        let records = vec![rec("Barbalha", (2023, 1, 1), 0, 25)];
        assert!(evaluate_alerts(&records, now(), 30).is_empty());
    }

    #[test]
    fn orders_by_days_then_location() {
        let records = vec![
            rec("Juazeiro", (2024, 1, 1), 1, 0),
            rec("Barbalha", (2023, 12, 1), 1, 0),
            rec("Crato", (2024, 1, 1), 1, 0),
        ];
        let order: Vec<_> = evaluate_alerts(&records, now(), 30)
            .into_iter()
            .map(|a| a.location)
            .collect();
        assert_eq!(order, vec!["Barbalha", "Crato", "Juazeiro"]);
    }
}
