//! CSV feed loading: header resolution followed by row normalization.

use std::collections::BTreeMap;
use std::io::Read;

use hipo_core::{DeliveryRecord, SchemaMapping};

use crate::error::{IngestError, IssueKind, ParseIssue};
use crate::normalize::normalize_row;

/// The normalized content of one feed fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedFeed {
    /// Accepted records in source order.
    pub records: Vec<DeliveryRecord>,
    /// Every per-row warning, including those for rejected rows.
    pub issues: Vec<ParseIssue>,
    /// Rows skipped entirely (blank location).
    pub rejected_rows: usize,
}

impl LoadedFeed {
    /// Counts issues by kind, for diagnostics output.
    #[must_use]
    pub fn issue_counts(&self) -> BTreeMap<IssueKind, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn unmappable_records(&self) -> usize {
        self.records.iter().filter(|r| !r.is_mappable()).count()
    }
}

/// Reads a CSV feed, resolves its header row against `mapping`, and
/// normalizes every data row.
///
/// Rows whose cells are all blank (trailing spreadsheet rows) are skipped
/// without a warning.
///
/// # Errors
///
/// - [`IngestError::Schema`] when required columns are missing or ambiguous.
/// - [`IngestError::MalformedFeed`] when the CSV itself cannot be read
///   (invalid UTF-8, I/O failure mid-stream).
pub fn load_feed<R: Read>(reader: R, mapping: &SchemaMapping) -> Result<LoadedFeed, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(IngestError::MalformedFeed)?
        .clone();
    let header_names: Vec<&str> = headers.iter().collect();
    let schema = mapping.resolve(&header_names)?;
    tracing::debug!(?schema, "resolved feed columns");

    let mut feed = LoadedFeed::default();
    for (idx, result) in csv_reader.records().enumerate() {
        let row = result.map_err(IngestError::MalformedFeed)?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = row
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(idx + 2);

        match normalize_row(&row, &schema, line) {
            Ok(normalized) => {
                feed.issues.extend(normalized.issues);
                feed.records.push(normalized.record);
            }
            Err(issue) => {
                tracing::debug!(%issue, "skipping feed row");
                feed.issues.push(issue);
                feed.rejected_rows += 1;
            }
        }
    }

    if !feed.issues.is_empty() {
        tracing::warn!(
            issues = feed.issues.len(),
            rejected_rows = feed.rejected_rows,
            "feed rows needed degradation during normalization"
        );
    }
    tracing::info!(
        records = feed.records.len(),
        unmappable = feed.unmappable_records(),
        "loaded delivery feed"
    );

    Ok(feed)
}

#[cfg(test)]
mod tests {
    use hipo_core::SchemaError;

    use super::*;

    const SAMPLE_CSV: &str = "\
Localidade, Data ,Latitude,Longitude,Caixas,Estoque
Crato,10/01/2024,-7.23,-39.41,2,0
Crato,20/01/2024,-7.23,-39.41,0,40
,21/01/2024,-7.23,-39.41,1,0
Barbalha,15/01/2024,Â-7.31,-39.30,3,
Juazeiro,ontem,xx,-39.31,abc,5
,,,,,
";

    #[test]
    fn load_sample_csv() {
        let feed = load_feed(SAMPLE_CSV.as_bytes(), &SchemaMapping::default()).unwrap();
        assert_eq!(feed.records.len(), 4);
        assert_eq!(feed.rejected_rows, 1);
        assert_eq!(feed.records[0].location, "Crato");
        assert_eq!(feed.records[0].line, 2);
        assert_eq!(feed.records[2].location, "Barbalha");
        assert_eq!(feed.records[2].line, 5);
        assert!(feed.records[2].is_mappable());
        assert_eq!(feed.unmappable_records(), 1);
    }

    #[test]
    fn issue_counts_group_by_kind() {
        let feed = load_feed(SAMPLE_CSV.as_bytes(), &SchemaMapping::default()).unwrap();
        let counts = feed.issue_counts();
        assert_eq!(counts.get(&IssueKind::MissingLocation), Some(&1));
        assert_eq!(counts.get(&IssueKind::UnparsableDate), Some(&1));
        assert_eq!(counts.get(&IssueKind::UnparsableCoordinates), Some(&1));
        assert_eq!(counts.get(&IssueKind::NonNumeric), Some(&1));
        assert_eq!(feed.issues.len(), 4);
    }

    #[test]
    fn load_feed_fails_with_missing_columns() {
        let csv = "Localidade,Latitude,Longitude\nCrato,-7.2,-39.3\n";
        let err = load_feed(csv.as_bytes(), &SchemaMapping::default()).unwrap_err();
        match err {
            IngestError::Schema(SchemaError::MissingColumns { missing }) => {
                assert_eq!(missing, vec!["date", "boxes"]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn load_feed_empty_input_has_no_header() {
        let err = load_feed("".as_bytes(), &SchemaMapping::default()).unwrap_err();
        assert!(matches!(err, IngestError::Schema(SchemaError::EmptyHeader)));
    }

    #[test]
    fn load_feed_header_only_yields_no_records() {
        let csv = "localidade,data,coordenadas,caixas\n";
        let feed = load_feed(csv.as_bytes(), &SchemaMapping::default()).unwrap();
        assert!(feed.records.is_empty());
        assert!(feed.issues.is_empty());
    }

    #[test]
    fn load_feed_rejects_invalid_utf8() {
        let mut bytes =
            b"localidade,data,coordenadas,caixas\nCrato,10/01/2024,\"-7.2,-39.3\",1\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe,10/01/2024,\"-7.2,-39.3\",1\n");
        let err = load_feed(bytes.as_slice(), &SchemaMapping::default()).unwrap_err();
        assert!(matches!(err, IngestError::MalformedFeed(_)));
    }

    #[test]
    fn load_feed_quoted_combined_coordinates() {
        let csv = "localidade,data,coordenadas,caixas\nCrato,10/01/2024,\"-7.2,-39.3\",1\n";
        let feed = load_feed(csv.as_bytes(), &SchemaMapping::default()).unwrap();
        let coords = feed.records[0].coordinates.unwrap();
        assert_eq!((coords.latitude, coords.longitude), (-7.2, -39.3));
    }

    #[test]
    fn load_feed_counts_bottles_when_feed_has_no_boxes_column() {
        let csv = "localidade,latitude,longitude,data,frascos,mês,ano\n\
                   Crato,-7.2,Â-39.3,10/01/2024,100,1,2024\n";
        let feed = load_feed(csv.as_bytes(), &SchemaMapping::default()).unwrap();
        assert_eq!(feed.records.len(), 1);
        assert!(feed.issues.is_empty());
        let record = &feed.records[0];
        assert_eq!(record.bottles_delivered(), 100);
        let coords = record.coordinates.unwrap();
        assert_eq!((coords.latitude, coords.longitude), (-7.2, -39.3));
    }
}
