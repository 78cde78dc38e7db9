use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Bottles of hypochlorite shipped in one delivered box.
pub const BOTTLES_PER_BOX: u64 = 50;

/// A validated latitude/longitude pair.
///
/// Both values are finite and inside the geographic range; construction goes
/// through [`Coordinates::new`] so a `Coordinates` value is always mappable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` when either value is non-finite or out of range.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        (lat_ok && lon_ok).then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Total ordering over coordinate pairs, latitude first.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }

    /// Bit-exact key, usable in hash and ordered maps.
    #[must_use]
    pub fn key(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// A calendar month, the granularity of the year/month selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// One normalized row of the delivery feed.
///
/// Records are never mutated after normalization; every pipeline stage
/// borrows them and builds its own output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// 1-based line in the source CSV (header is line 1). Ingestion order.
    pub line: usize,
    pub location: String,
    pub date: Option<NaiveDate>,
    /// Derived from `date`, or from the feed's pre-split year/month columns
    /// when the date itself is missing.
    pub period: Option<Period>,
    /// `None` when the feed's coordinates could not be parsed; such records
    /// are kept for totals but never placed on a map.
    pub coordinates: Option<Coordinates>,
    pub boxes: u32,
    /// Bottle count taken straight from feeds that report bottles instead of
    /// boxes. `None` means bottles are derived from `boxes`.
    pub bottles: Option<u32>,
    pub remaining_stock: u32,
}

impl DeliveryRecord {
    #[must_use]
    pub fn bottles_delivered(&self) -> u64 {
        self.bottles
            .map_or(u64::from(self.boxes) * BOTTLES_PER_BOX, u64::from)
    }

    #[must_use]
    pub fn is_delivery(&self) -> bool {
        self.bottles_delivered() > 0
    }

    #[must_use]
    pub fn is_stock_declaration(&self) -> bool {
        self.remaining_stock > 0
    }

    #[must_use]
    pub fn is_pure_stock_declaration(&self) -> bool {
        self.remaining_stock > 0 && !self.is_delivery()
    }

    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.coordinates.is_some()
    }
}
