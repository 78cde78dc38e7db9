//! Map marker descriptors for the delivery and stock tables.

use hipo_core::Coordinates;
use serde::Serialize;

use crate::aggregate::DeliveryRow;
use crate::reconcile::StockRow;

/// A point for the map layer, with its popup text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl MapMarker {
    pub(crate) fn delivery(row: &DeliveryRow, coordinates: Coordinates) -> Self {
        let mut label = format!("{}\nEntregue: {} frascos", row.location, row.bottles);
        if let Some(period) = row.period {
            label.push('\n');
            label.push_str(&period.to_string());
        }
        Self::at(coordinates, label)
    }

    pub(crate) fn stock(row: &StockRow, coordinates: Coordinates) -> Self {
        let when = row
            .period
            .map_or_else(|| "sem data".to_owned(), |p| p.to_string());
        let label = format!(
            "{}\nEstoque: {} frascos\n{when}",
            row.location, row.remaining_stock
        );
        Self::at(coordinates, label)
    }

    fn at(coordinates: Coordinates, label: String) -> Self {
        Self {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            label,
        }
    }
}
