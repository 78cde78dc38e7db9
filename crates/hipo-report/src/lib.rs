//! Filtered views over normalized delivery records: delivery totals, valid
//! stock, overdue-delivery alerts and map markers.

pub mod aggregate;
pub mod alerts;
pub mod filter;
pub mod markers;
pub mod pipeline;
pub mod reconcile;

pub use aggregate::{aggregate_deliveries, DeliveryRow, DeliveryTable, PeriodRange, TOTAL_LABEL};
pub use alerts::{evaluate_alerts, AlertRow, DEFAULT_ALERT_THRESHOLD_DAYS};
pub use filter::{FilterError, FilterOptions, FilterSpec, Selection, ALL_SELECTOR};
pub use markers::MapMarker;
pub use pipeline::{run_pipeline, IssuesSummary, PipelineOptions, Report};
pub use reconcile::{reconcile_stock, StockRow, StockTable};
