//! Integration tests for `FeedClient` and `FeedReader`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use chrono::{TimeZone, Utc};
use hipo_core::{FeedSource, SchemaError, SchemaMapping};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hipo_ingest::{FeedCache, FeedClient, FeedLoader, FeedReader, FetchError, IngestError};

const FEED_CSV: &str = "\
Localidade,Data,Coordenadas,Caixas,Estoque
Crato,10/01/2024,\"-7.23,-39.41\",2,0
Crato,20/01/2024,\"-7.23,-39.41\",0,40
";

/// 5-second timeout, descriptive UA, no retries.
fn test_client() -> FeedClient {
    FeedClient::new(5, "hipo-test/0.1", 0, 0).expect("failed to build test FeedClient")
}

fn reader_for(server: &MockServer, client: FeedClient) -> FeedReader {
    FeedReader::new(
        client,
        FeedSource::Url(format!("{}/feed.csv", server.uri())),
        SchemaMapping::default(),
    )
}

#[tokio::test]
async fn fetch_csv_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_CSV))
        .mount(&server)
        .await;

    let body = test_client()
        .fetch_csv(&format!("{}/feed.csv", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, FEED_CSV);
}

#[tokio::test]
async fn fetch_csv_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_csv(&format!("{}/feed.csv", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }), "got: {err:?}");
}

#[tokio::test]
async fn fetch_csv_maps_429_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_csv(&format!("{}/feed.csv", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::RateLimited { retry_after_secs: 17, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_csv_retries_server_error_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_CSV))
        .mount(&server)
        .await;

    let client = FeedClient::new(5, "hipo-test/0.1", 2, 0).unwrap();
    let body = client
        .fetch_csv(&format!("{}/feed.csv", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, FEED_CSV);
}

#[tokio::test]
async fn fetch_csv_does_not_retry_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = FeedClient::new(5, "hipo-test/0.1", 3, 0).unwrap();
    let err = client
        .fetch_csv(&format!("{}/feed.csv", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::UnexpectedStatus { status: 403, .. }
    ));
}

#[tokio::test]
async fn fetch_csv_rejects_invalid_url() {
    let err = test_client().fetch_csv("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }));
}

#[tokio::test]
async fn reader_loads_and_normalizes_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_CSV))
        .mount(&server)
        .await;

    let feed = reader_for(&server, test_client()).load().await.unwrap();
    assert_eq!(feed.records.len(), 2);
    assert_eq!(feed.records[0].boxes, 2);
    assert_eq!(feed.records[1].remaining_stock, 40);
    assert!(feed.issues.is_empty());
}

#[tokio::test]
async fn reader_surfaces_unreachable_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = reader_for(&server, test_client()).load().await.unwrap_err();
    match err {
        IngestError::SourceUnavailable { feed, source } => {
            assert!(feed.ends_with("/feed.csv"));
            assert!(matches!(source, FetchError::UnexpectedStatus { status: 500, .. }));
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn reader_surfaces_schema_error_with_missing_columns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Localidade,Caixas\nCrato,1\n"))
        .mount(&server)
        .await;

    let err = reader_for(&server, test_client()).load().await.unwrap_err();
    let message = err.to_string();
    assert!(
        matches!(err, IngestError::Schema(SchemaError::MissingColumns { .. })),
        "got: {err:?}"
    );
    assert!(message.contains("date"), "message: {message}");
    assert!(message.contains("latitude"), "message: {message}");
}

#[tokio::test]
async fn reader_reads_local_file_source() {
    let path = std::env::temp_dir().join(format!("hipo-feed-{}.csv", std::process::id()));
    std::fs::write(&path, FEED_CSV).unwrap();

    let reader = FeedReader::new(
        test_client(),
        FeedSource::File(path.clone()),
        SchemaMapping::default(),
    );
    let feed = reader.load().await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(feed.records.len(), 2);
}

#[tokio::test]
async fn reader_reports_missing_local_file() {
    let reader = FeedReader::new(
        test_client(),
        FeedSource::File("/nonexistent/dados.csv".into()),
        SchemaMapping::default(),
    );
    let err = reader.load().await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::SourceUnavailable {
            source: FetchError::FileIo { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn cache_fetches_once_within_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_CSV))
        .expect(1)
        .mount(&server)
        .await;

    let mut cache = FeedCache::new(reader_for(&server, test_client()), 300);
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let first = cache.get_or_fetch(now).await.unwrap();
    let second = cache
        .get_or_fetch(now + chrono::TimeDelta::seconds(120))
        .await
        .unwrap();
    assert_eq!(first.records, second.records);
}
