use super::*;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// -----------------------------------------------------------------------
// parse_date
// -----------------------------------------------------------------------

#[test]
fn parse_date_day_first_slashes() {
    assert_eq!(parse_date("10/01/2024"), Some(ymd(2024, 1, 10)));
    assert_eq!(parse_date(" 1/2/2024 "), Some(ymd(2024, 2, 1)));
}

#[test]
fn parse_date_rejects_month_thirteen_in_primary_format() {
    // 01/13/2024 is not a valid day-first date and no fallback accepts it.
    assert_eq!(parse_date("01/13/2024"), None);
}

#[test]
fn parse_date_iso_and_other_separators() {
    assert_eq!(parse_date("2024-01-20"), Some(ymd(2024, 1, 20)));
    assert_eq!(parse_date("20-01-2024"), Some(ymd(2024, 1, 20)));
    assert_eq!(parse_date("20.01.2024"), Some(ymd(2024, 1, 20)));
    assert_eq!(parse_date("2024/01/20"), Some(ymd(2024, 1, 20)));
}

#[test]
fn parse_date_two_digit_year_is_not_read_as_year_24() {
    assert_eq!(parse_date("10/01/24"), Some(ymd(2024, 1, 10)));
}

#[test]
fn parse_date_datetime_forms() {
    assert_eq!(parse_date("10/01/2024 14:30:00"), Some(ymd(2024, 1, 10)));
    assert_eq!(parse_date("10/01/2024 14:30"), Some(ymd(2024, 1, 10)));
    assert_eq!(parse_date("2024-01-10 08:00:00"), Some(ymd(2024, 1, 10)));
    assert_eq!(parse_date("2024-01-10T08:00:00"), Some(ymd(2024, 1, 10)));
    assert_eq!(parse_date("2024-01-10T08:00:00-03:00"), Some(ymd(2024, 1, 10)));
}

#[test]
fn parse_date_finds_date_inside_free_text() {
    assert_eq!(
        parse_date("entregue em 05/03/2024 pelo agente"),
        Some(ymd(2024, 3, 5))
    );
    assert_eq!(parse_date("ref 2024-03-05 (lote 2)"), Some(ymd(2024, 3, 5)));
}

#[test]
fn parse_date_blank_and_garbage_are_none() {
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("   "), None);
    assert_eq!(parse_date("sem data"), None);
    assert_eq!(parse_date("31/02/2024"), None);
}

// -----------------------------------------------------------------------
// coordinates
// -----------------------------------------------------------------------

#[test]
fn parse_coordinate_part_strips_encoding_noise() {
    assert_eq!(parse_coordinate_part("Â-43.8"), Some(-43.8));
    assert_eq!(parse_coordinate_part(" -7.2 "), Some(-7.2));
    assert_eq!(parse_coordinate_part("-39.3°"), Some(-39.3));
}

#[test]
fn parse_coordinate_part_rejects_empty_and_malformed() {
    assert_eq!(parse_coordinate_part("Â"), None);
    assert_eq!(parse_coordinate_part(""), None);
    assert_eq!(parse_coordinate_part("1-2"), None);
    assert_eq!(parse_coordinate_part("1.2.3"), None);
}

#[test]
fn parse_combined_coordinates_with_noise() {
    let coords = parse_combined_coordinates("-16.7,Â-43.8").unwrap();
    assert_eq!(coords.latitude, -16.7);
    assert_eq!(coords.longitude, -43.8);
}

#[test]
fn parse_combined_coordinates_semicolon_separator() {
    let coords = parse_combined_coordinates("-7.23; -39.41").unwrap();
    assert_eq!(coords.latitude, -7.23);
    assert_eq!(coords.longitude, -39.41);
}

#[test]
fn parse_combined_coordinates_errors() {
    assert_eq!(
        parse_combined_coordinates(""),
        Err(IssueKind::MissingCoordinates)
    );
    assert_eq!(
        parse_combined_coordinates("-16.7"),
        Err(IssueKind::UnparsableCoordinates)
    );
    assert_eq!(
        parse_combined_coordinates("-16,7,-43,8"),
        Err(IssueKind::UnparsableCoordinates)
    );
    assert_eq!(
        parse_combined_coordinates("-16.7,"),
        Err(IssueKind::UnparsableCoordinates)
    );
    assert_eq!(
        parse_combined_coordinates("-167,-438"),
        Err(IssueKind::CoordinatesOutOfRange)
    );
}

#[test]
fn parse_coordinates_split_columns() {
    let coords = parse_coordinates("-7.2", "-39.3").unwrap();
    assert_eq!((coords.latitude, coords.longitude), (-7.2, -39.3));
    assert_eq!(
        parse_coordinates("", " "),
        Err(IssueKind::MissingCoordinates)
    );
    assert_eq!(
        parse_coordinates("-7.2", ""),
        Err(IssueKind::UnparsableCoordinates)
    );
}

// -----------------------------------------------------------------------
// counts, years, months
// -----------------------------------------------------------------------

#[test]
fn parse_count_coerces_numeric_text() {
    assert_eq!(parse_count("3"), Ok(3));
    assert_eq!(parse_count(" 2.0 "), Ok(2));
    assert_eq!(parse_count("2.9"), Ok(2));
    assert_eq!(parse_count(""), Ok(0));
    assert_eq!(parse_count("NaN"), Ok(0));
    assert_eq!(parse_count("-"), Ok(0));
}

#[test]
fn parse_count_reports_bad_values() {
    assert_eq!(parse_count("dois"), Err(IssueKind::NonNumeric));
    assert_eq!(parse_count("inf"), Err(IssueKind::NonNumeric));
    assert_eq!(parse_count("-4"), Err(IssueKind::NegativeCount));
}

#[test]
fn parse_count_saturates_huge_values() {
    assert_eq!(parse_count("1e20"), Ok(u32::MAX));
}

#[test]
fn parse_year_accepts_plausible_years_only() {
    assert_eq!(parse_year("2024"), Some(2024));
    assert_eq!(parse_year("2024.0"), Some(2024));
    assert_eq!(parse_year("24"), None);
    assert_eq!(parse_year(""), None);
}

#[test]
fn parse_month_numbers_and_names() {
    assert_eq!(parse_month("1"), Some(1));
    assert_eq!(parse_month("12.0"), Some(12));
    assert_eq!(parse_month("13"), None);
    assert_eq!(parse_month("0"), None);
    assert_eq!(parse_month("Março"), Some(3));
    assert_eq!(parse_month("marco"), Some(3));
    assert_eq!(parse_month("DEZ"), Some(12));
    assert_eq!(parse_month("fev"), Some(2));
    assert_eq!(parse_month("smarch"), None);
}
