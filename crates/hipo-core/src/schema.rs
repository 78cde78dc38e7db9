//! Declared column mapping for the delivery feed.
//!
//! The feed's header names drift between spreadsheet revisions
//! (`"Localidade"`, `" localidade "`, `"Município"`, ...). Instead of guessing
//! per call site, every canonical [`Field`] lists the header aliases it
//! accepts. The mapping is resolved once per load against the actual header
//! row, producing a [`ResolvedSchema`] of column indices.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ConfigError;

/// Canonical feed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Location,
    Date,
    Latitude,
    Longitude,
    /// A single `"lat,lon"` column used instead of separate latitude/longitude.
    Coordinates,
    Boxes,
    /// Delivered bottle count, read only when the feed has no boxes column.
    Bottles,
    RemainingStock,
    Year,
    Month,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Location,
        Field::Date,
        Field::Latitude,
        Field::Longitude,
        Field::Coordinates,
        Field::Boxes,
        Field::Bottles,
        Field::RemainingStock,
        Field::Year,
        Field::Month,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Location => "location",
            Field::Date => "date",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::Coordinates => "coordinates",
            Field::Boxes => "boxes",
            Field::Bottles => "bottles",
            Field::RemainingStock => "remaining_stock",
            Field::Year => "year",
            Field::Month => "month",
        }
    }

    fn default_aliases(self) -> &'static [&'static str] {
        match self {
            Field::Location => &["localidade", "local", "location", "municipio", "município"],
            Field::Date => &["data", "date", "data da entrega", "data_entrega"],
            Field::Latitude => &["latitude", "lat"],
            Field::Longitude => &["longitude", "lon", "lng", "long"],
            Field::Coordinates => &["coordenadas", "coordinates", "lat,lon", "latlon"],
            Field::Boxes => &["caixas", "boxes", "qtd caixas", "quantidade de caixas"],
            Field::Bottles => &["frascos", "quantidade", "bottles", "frascos entregues"],
            Field::RemainingStock => &[
                "estoque",
                "remaining_stock",
                "estoque restante",
                "frascos em estoque",
            ],
            Field::Year => &["ano", "year"],
            Field::Month => &["mês", "mes", "month"],
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors raised while matching the header row against a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("feed is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("column for '{field}' is ambiguous: headers {} all match", headers.join(", "))]
    AmbiguousColumn { field: Field, headers: Vec<String> },

    #[error("feed has no header row")]
    EmptyHeader,
}

/// Normalizes a header or alias for comparison: strips a UTF-8 BOM, trims,
/// lowercases and collapses inner whitespace.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `{field: [accepted aliases]}`, validated so no alias belongs to two fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    columns: BTreeMap<Field, Vec<String>>,
}

impl Default for SchemaMapping {
    fn default() -> Self {
        let columns = Field::ALL
            .iter()
            .map(|&field| {
                let aliases = field
                    .default_aliases()
                    .iter()
                    .map(|a| normalize_header(a))
                    .collect();
                (field, aliases)
            })
            .collect();
        Self { columns }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    columns: BTreeMap<Field, Vec<String>>,
}

impl SchemaMapping {
    /// Builds a mapping from explicit alias lists. Fields not listed keep
    /// their built-in aliases.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if a listed field has no aliases or
    /// an alias is claimed by more than one field.
    pub fn new(overrides: BTreeMap<Field, Vec<String>>) -> Result<Self, ConfigError> {
        let mut mapping = Self::default();
        for (field, aliases) in overrides {
            let aliases: Vec<String> = aliases
                .iter()
                .map(|a| normalize_header(a))
                .filter(|a| !a.is_empty())
                .collect();
            if aliases.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "schema field '{field}' must list at least one column name"
                )));
            }
            mapping.columns.insert(field, aliases);
        }
        mapping.validate()?;
        Ok(mapping)
    }

    /// Parses a YAML document of the form `columns: { field: [aliases] }`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SchemaFileParse`] on malformed YAML and
    /// [`ConfigError::Validation`] on conflicting aliases.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let file: SchemaFile = serde_yaml::from_str(content).map_err(ConfigError::SchemaFileParse)?;
        Self::new(file.columns)
    }

    #[must_use]
    pub fn aliases(&self, field: Field) -> &[String] {
        self.columns.get(&field).map_or(&[], Vec::as_slice)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut owner: HashMap<&str, Field> = HashMap::new();
        for (&field, aliases) in &self.columns {
            for alias in aliases {
                if let Some(&other) = owner.get(alias.as_str()) {
                    if other != field {
                        return Err(ConfigError::Validation(format!(
                            "column name '{alias}' is mapped to both '{other}' and '{field}'"
                        )));
                    }
                }
                owner.insert(alias, field);
            }
        }
        Ok(())
    }

    /// Matches this mapping against a header row.
    ///
    /// Required: location, date (or both year and month), boxes (or a
    /// bottles column), and either latitude + longitude or a combined
    /// coordinates column. When both coordinate forms are present the split
    /// columns win.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::EmptyHeader`] when `headers` is empty.
    /// - [`SchemaError::AmbiguousColumn`] when two headers match one field.
    /// - [`SchemaError::MissingColumns`] naming every absent required field.
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Result<ResolvedSchema, SchemaError> {
        if headers.is_empty() {
            return Err(SchemaError::EmptyHeader);
        }

        let mut found: BTreeMap<Field, Vec<(usize, String)>> = BTreeMap::new();
        for (idx, raw) in headers.iter().enumerate() {
            let header = normalize_header(raw.as_ref());
            if header.is_empty() {
                continue;
            }
            for (&field, aliases) in &self.columns {
                if aliases.iter().any(|a| *a == header) {
                    found
                        .entry(field)
                        .or_default()
                        .push((idx, raw.as_ref().to_owned()));
                }
            }
        }

        let mut index = BTreeMap::new();
        for (field, hits) in found {
            if hits.len() > 1 {
                return Err(SchemaError::AmbiguousColumn {
                    field,
                    headers: hits.into_iter().map(|(_, h)| h).collect(),
                });
            }
            index.insert(field, hits[0].0);
        }

        // Pre-split year + month columns stand in for a date column.
        let has_period_columns =
            index.contains_key(&Field::Year) && index.contains_key(&Field::Month);
        let mut missing = Vec::new();
        for field in [Field::Location, Field::Date, Field::Boxes] {
            let satisfied = index.contains_key(&field)
                || (field == Field::Date && has_period_columns)
                || (field == Field::Boxes && index.contains_key(&Field::Bottles));
            if !satisfied {
                missing.push(field.as_str().to_owned());
            }
        }

        let quantity = match (index.get(&Field::Boxes), index.get(&Field::Bottles)) {
            (Some(&boxes), _) => Some(QuantityColumn::Boxes(boxes)),
            (None, Some(&bottles)) => Some(QuantityColumn::Bottles(bottles)),
            (None, None) => None,
        };

        let coordinates = match (
            index.get(&Field::Latitude),
            index.get(&Field::Longitude),
            index.get(&Field::Coordinates),
        ) {
            (Some(&latitude), Some(&longitude), _) => Some(CoordinateColumns::Split {
                latitude,
                longitude,
            }),
            (_, _, Some(&combined)) => Some(CoordinateColumns::Combined(combined)),
            (lat, lon, None) => {
                if lat.is_none() {
                    missing.push(Field::Latitude.as_str().to_owned());
                }
                if lon.is_none() {
                    missing.push(Field::Longitude.as_str().to_owned());
                }
                None
            }
        };

        match (coordinates, quantity, missing.is_empty()) {
            (Some(coordinates), Some(quantity), true) => Ok(ResolvedSchema {
                location: index[&Field::Location],
                date: index.get(&Field::Date).copied(),
                coordinates,
                quantity,
                remaining_stock: index.get(&Field::RemainingStock).copied(),
                year: index.get(&Field::Year).copied(),
                month: index.get(&Field::Month).copied(),
            }),
            _ => Err(SchemaError::MissingColumns { missing }),
        }
    }
}

/// Loads a schema mapping override from a YAML file.
///
/// # Errors
///
/// Returns [`ConfigError::SchemaFileIo`] if the file cannot be read, plus any
/// error from [`SchemaMapping::from_yaml_str`].
pub fn load_schema(path: &Path) -> Result<SchemaMapping, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SchemaFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    SchemaMapping::from_yaml_str(&content)
}

/// Where coordinates live in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateColumns {
    Split { latitude: usize, longitude: usize },
    Combined(usize),
}

/// Which column carries the delivered quantity. A boxes column wins when
/// both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityColumn {
    Boxes(usize),
    /// Bottles counted directly, as in the original `frascos` sheets.
    Bottles(usize),
}

/// Column indices for one concrete header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub location: usize,
    /// `None` only when the feed carries year and month columns instead.
    pub date: Option<usize>,
    pub coordinates: CoordinateColumns,
    pub quantity: QuantityColumn,
    pub remaining_stock: Option<usize>,
    pub year: Option<usize>,
    pub month: Option<usize>,
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
