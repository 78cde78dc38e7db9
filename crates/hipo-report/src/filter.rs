//! Year / month / location selection.
//!
//! The dashboard's selectors send either a concrete value or the sentinel
//! `"Todos"` ("all"). A [`FilterSpec`] is the parsed, conjunctive form.

use std::collections::BTreeSet;

use hipo_core::DeliveryRecord;
use serde::Serialize;
use thiserror::Error;

/// Selector label meaning "no restriction on this dimension".
pub const ALL_SELECTOR: &str = "Todos";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid year selection '{0}'")]
    InvalidYear(String),

    #[error("invalid month selection '{0}'; expected 1-12")]
    InvalidMonth(String),
}

/// One selector value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Value(String),
}

impl Selection {
    /// `"Todos"`, `"all"` (any case) and blank mean [`Selection::All`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL_SELECTOR) || s.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::Value(s.to_owned())
        }
    }
}

/// Conjunctive record filter. `None` on a dimension matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub year: Option<i32>,
    pub months: Option<BTreeSet<u32>>,
    pub location: Option<String>,
}

impl FilterSpec {
    /// Builds a filter from raw selector strings.
    ///
    /// The month selector is a multi-select; if any entry is "all" or the
    /// list is empty, months are unrestricted.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] when a year or month value is not a number in
    /// range.
    pub fn from_selectors<S: AsRef<str>>(
        year: &str,
        months: &[S],
        location: &str,
    ) -> Result<Self, FilterError> {
        let year = match Selection::parse(year) {
            Selection::All => None,
            Selection::Value(v) => Some(
                v.parse::<i32>()
                    .map_err(|_| FilterError::InvalidYear(v.clone()))?,
            ),
        };

        let selections: Vec<Selection> =
            months.iter().map(|m| Selection::parse(m.as_ref())).collect();
        let months = if selections.is_empty() || selections.contains(&Selection::All) {
            None
        } else {
            let mut set = BTreeSet::new();
            for selection in selections {
                if let Selection::Value(v) = selection {
                    let month = v
                        .parse::<u32>()
                        .ok()
                        .filter(|m| (1..=12).contains(m))
                        .ok_or_else(|| FilterError::InvalidMonth(v.clone()))?;
                    set.insert(month);
                }
            }
            Some(set)
        };

        let location = match Selection::parse(location) {
            Selection::All => None,
            Selection::Value(v) => Some(v),
        };

        Ok(Self {
            year,
            months,
            location,
        })
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.year.is_none() && self.months.is_none() && self.location.is_none()
    }

    /// A record without a period never matches a year or month restriction.
    #[must_use]
    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        if let Some(location) = &self.location {
            if record.location != *location {
                return false;
            }
        }
        if self.year.is_none() && self.months.is_none() {
            return true;
        }
        let Some(period) = record.period else {
            return false;
        };
        self.year.is_none_or(|y| period.year == y)
            && self
                .months
                .as_ref()
                .is_none_or(|months| months.contains(&period.month))
    }
}

/// Options offered by the year, month and location selectors: the "all"
/// sentinel followed by the sorted distinct values present in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub years: Vec<String>,
    pub months: Vec<String>,
    pub locations: Vec<String>,
}

impl FilterOptions {
    #[must_use]
    pub fn from_records(records: &[DeliveryRecord]) -> Self {
        let periods = || records.iter().filter_map(|r| r.period);
        let years: BTreeSet<i32> = periods().map(|p| p.year).collect();
        let months: BTreeSet<u32> = periods().map(|p| p.month).collect();
        let locations: BTreeSet<&str> = records.iter().map(|r| r.location.as_str()).collect();

        let with_all = |values: Vec<String>| {
            std::iter::once(ALL_SELECTOR.to_owned())
                .chain(values)
                .collect::<Vec<_>>()
        };

        Self {
            years: with_all(years.iter().map(ToString::to_string).collect()),
            months: with_all(months.iter().map(ToString::to_string).collect()),
            locations: with_all(locations.iter().map(|l| (*l).to_owned()).collect()),
        }
    }
}
