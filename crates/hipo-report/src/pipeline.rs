//! One filtered report over a loaded feed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hipo_core::StockPolicy;
use hipo_ingest::LoadedFeed;
use serde::Serialize;

use crate::aggregate::{aggregate_deliveries, DeliveryTable};
use crate::alerts::{evaluate_alerts, AlertRow, DEFAULT_ALERT_THRESHOLD_DAYS};
use crate::filter::FilterSpec;
use crate::markers::MapMarker;
use crate::reconcile::{reconcile_stock, StockTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub stock_policy: StockPolicy,
    pub alert_threshold_days: i64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            stock_policy: StockPolicy::default(),
            alert_threshold_days: DEFAULT_ALERT_THRESHOLD_DAYS,
        }
    }
}

/// Row-level diagnostics carried alongside the tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuesSummary {
    pub records: usize,
    pub rejected_rows: usize,
    pub unmappable_records: usize,
    /// Issue count per kind, keyed by the kind's description.
    pub by_kind: BTreeMap<String, usize>,
}

impl IssuesSummary {
    #[must_use]
    pub fn from_feed(feed: &LoadedFeed) -> Self {
        Self {
            records: feed.records.len(),
            rejected_rows: feed.rejected_rows,
            unmappable_records: feed.unmappable_records(),
            by_kind: feed
                .issue_counts()
                .into_iter()
                .map(|(kind, n)| (kind.to_string(), n))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub filter: FilterSpec,
    pub stock_policy: StockPolicy,
    pub deliveries: DeliveryTable,
    pub stock: StockTable,
    /// Computed over the whole feed; the filter does not apply.
    pub alerts: Vec<AlertRow>,
    pub delivery_markers: Vec<MapMarker>,
    pub stock_markers: Vec<MapMarker>,
    pub issues_summary: IssuesSummary,
}

/// Runs aggregation, reconciliation and alert evaluation over `feed`.
///
/// Pure: the same feed, filter, options and `now` always yield an equal
/// report.
#[must_use]
pub fn run_pipeline(
    feed: &LoadedFeed,
    filter: &FilterSpec,
    options: &PipelineOptions,
    now: DateTime<Utc>,
) -> Report {
    let deliveries = aggregate_deliveries(&feed.records, filter);
    let stock = reconcile_stock(&feed.records, filter, options.stock_policy);
    let alerts = evaluate_alerts(&feed.records, now, options.alert_threshold_days);
    let delivery_markers = deliveries.markers();
    let stock_markers = stock.markers();

    tracing::info!(
        records = feed.records.len(),
        delivery_groups = deliveries.groups().count(),
        stock_rows = stock.rows.len(),
        alerts = alerts.len(),
        issues = feed.issues.len(),
        "report built"
    );

    Report {
        generated_at: now,
        filter: filter.clone(),
        stock_policy: options.stock_policy,
        deliveries,
        stock,
        alerts,
        delivery_markers,
        stock_markers,
        issues_summary: IssuesSummary::from_feed(feed),
    }
}
