//! Command handlers for the CLI.
//!
//! Each handler loads the feed through a [`FeedCache`], runs the relevant
//! stage and prints JSON to stdout. Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use hipo_core::{load_schema, AppConfig, SchemaMapping, StockPolicy};
use hipo_ingest::{FeedCache, FeedClient, FeedReader, LoadedFeed};
use hipo_report::{run_pipeline, FilterOptions, FilterSpec, IssuesSummary, PipelineOptions};
use serde::Serialize;

use crate::ReportArgs;

fn build_reader(config: &AppConfig) -> anyhow::Result<FeedReader> {
    let mapping = match &config.schema_path {
        Some(path) => load_schema(path)?,
        None => SchemaMapping::default(),
    };
    let client = FeedClient::new(
        config.fetch_timeout_secs,
        &config.fetch_user_agent,
        config.fetch_max_retries,
        config.fetch_retry_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build feed client: {e}"))?;
    Ok(FeedReader::new(client, config.feed_source.clone(), mapping))
}

fn build_cache(config: &AppConfig) -> anyhow::Result<FeedCache<FeedReader>> {
    Ok(FeedCache::new(build_reader(config)?, config.cache_ttl_secs))
}

async fn load_once(config: &AppConfig) -> anyhow::Result<Arc<LoadedFeed>> {
    let mut cache = build_cache(config)?;
    cache
        .get_or_fetch(Utc::now())
        .await
        .with_context(|| format!("failed to load feed from {}", config.feed_source))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

/// Parses `--now`: RFC 3339, or a bare date taken as midnight UTC.
pub(crate) fn parse_now(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(Utc::now());
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid --now '{raw}'; expected RFC 3339 or YYYY-MM-DD"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

pub(crate) fn pipeline_options(
    config: &AppConfig,
    policy: Option<&str>,
) -> anyhow::Result<PipelineOptions> {
    let stock_policy = match policy {
        Some(raw) => StockPolicy::parse(raw)
            .ok_or_else(|| anyhow::anyhow!("unknown stock policy '{raw}'"))?,
        None => config.stock_policy,
    };
    Ok(PipelineOptions {
        stock_policy,
        alert_threshold_days: config.alert_threshold_days,
    })
}

fn filter_from_args(args: &ReportArgs) -> anyhow::Result<FilterSpec> {
    Ok(FilterSpec::from_selectors(
        &args.year,
        &args.months,
        &args.location,
    )?)
}

pub(crate) async fn run_report(
    config: &AppConfig,
    args: &ReportArgs,
    pretty: bool,
) -> anyhow::Result<()> {
    let filter = filter_from_args(args)?;
    let options = pipeline_options(config, args.policy.as_deref())?;
    let now = parse_now(args.now.as_deref())?;

    let feed = load_once(config).await?;
    let report = run_pipeline(&feed, &filter, &options, now);
    print_json(&report, pretty)
}

/// Prints one report per tick until interrupted. A failed load is logged and
/// retried on the next tick.
pub(crate) async fn run_watch(
    config: &AppConfig,
    args: &ReportArgs,
    interval_secs: u64,
    pretty: bool,
) -> anyhow::Result<()> {
    let filter = filter_from_args(args)?;
    let options = pipeline_options(config, args.policy.as_deref())?;
    let mut cache = build_cache(config)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    tracing::info!(
        feed = %config.feed_source,
        interval_secs,
        cache_ttl_secs = config.cache_ttl_secs,
        "watching delivery feed"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("watch interrupted");
                return Ok(());
            }
        }

        let now = parse_now(args.now.as_deref())?;
        match cache.get_or_fetch(Utc::now()).await {
            Ok(feed) => print_json(&run_pipeline(&feed, &filter, &options, now), pretty)?,
            Err(e) => tracing::error!(error = %e, "feed load failed; retrying next tick"),
        }
    }
}

pub(crate) async fn run_options(config: &AppConfig, pretty: bool) -> anyhow::Result<()> {
    let feed = load_once(config).await?;
    print_json(&FilterOptions::from_records(&feed.records), pretty)
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    feed: String,
    summary: IssuesSummary,
    issues: Vec<String>,
    omitted_issues: usize,
}

/// Issues listed in `check` output before truncation.
const MAX_LISTED_ISSUES: usize = 50;

pub(crate) async fn run_check(config: &AppConfig, pretty: bool) -> anyhow::Result<()> {
    let feed = load_once(config).await?;
    let output = CheckOutput {
        feed: config.feed_source.to_string(),
        summary: IssuesSummary::from_feed(&feed),
        issues: feed
            .issues
            .iter()
            .take(MAX_LISTED_ISSUES)
            .map(ToString::to_string)
            .collect(),
        omitted_issues: feed.issues.len().saturating_sub(MAX_LISTED_ISSUES),
    };
    print_json(&output, pretty)
}
