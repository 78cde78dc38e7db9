use serde::{Deserialize, Serialize};

/// Rule deciding whether a location's declared remaining stock is still valid.
///
/// Historical revisions of the dashboard disagreed on this, so the rule is
/// explicit configuration rather than a guess. `R_last` below is the most
/// recent record of the location ordered by date, then by source line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockPolicy {
    /// Latest declaration with stock > 0, unless dated strictly before the
    /// location's latest delivery.
    #[default]
    SuppressStale,
    /// `R_last` when its stock > 0, regardless of deliveries.
    LatestRecord,
    /// `R_last` when stock > 0 and the same row delivered boxes.
    RequireDelivery,
    /// `R_last` when stock > 0 and the row delivered nothing.
    DeclarationOnly,
}

impl StockPolicy {
    /// Parses the kebab-case name used in `HIPO_STOCK_POLICY`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "suppress-stale" => Some(Self::SuppressStale),
            "latest-record" => Some(Self::LatestRecord),
            "require-delivery" => Some(Self::RequireDelivery),
            "declaration-only" => Some(Self::DeclarationOnly),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StockPolicy::SuppressStale => "suppress-stale",
            StockPolicy::LatestRecord => "latest-record",
            StockPolicy::RequireDelivery => "require-delivery",
            StockPolicy::DeclarationOnly => "declaration-only",
        };
        f.write_str(name)
    }
}
