mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hipo-cli")]
#[command(about = "Hypochlorite delivery, stock and alert reports")]
struct Cli {
    /// Read the feed from this CSV file instead of `HIPO_FEED_URL` / `HIPO_FEED_PATH`.
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Delivery totals, valid stock, overdue alerts and map markers.
    Report(ReportArgs),
    /// Rebuild the report every `--interval-secs`, reusing the cached feed
    /// until its TTL elapses.
    Watch {
        #[command(flatten)]
        report: ReportArgs,

        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
    /// Year, month and location selector options present in the feed.
    Options,
    /// Resolve the feed's columns and summarize per-row issues.
    Check,
}

#[derive(Debug, Clone, Args)]
struct ReportArgs {
    /// Year selector; "Todos" for all years.
    #[arg(long, default_value = "Todos")]
    year: String,

    /// Month selector, repeatable; omitted or "Todos" for all months.
    #[arg(long = "month")]
    months: Vec<String>,

    /// Location selector; "Todos" for all locations.
    #[arg(long, default_value = "Todos")]
    location: String,

    /// Reference instant for alerts (RFC 3339 or YYYY-MM-DD); defaults to now.
    #[arg(long)]
    now: Option<String>,

    /// Stock policy override (suppress-stale, latest-record,
    /// require-delivery, declaration-only).
    #[arg(long)]
    policy: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.file {
        Some(path) => hipo_core::load_app_config_with_feed_file(path)?,
        None => hipo_core::load_app_config()?,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        feed = %config.feed_source,
        policy = %config.stock_policy,
        cache_ttl_secs = config.cache_ttl_secs,
        "configuration loaded"
    );

    match cli.command {
        Commands::Report(args) => commands::run_report(&config, &args, cli.pretty).await,
        Commands::Watch {
            report,
            interval_secs,
        } => commands::run_watch(&config, &report, interval_secs, cli.pretty).await,
        Commands::Options => commands::run_options(&config, cli.pretty).await,
        Commands::Check => commands::run_check(&config, cli.pretty).await,
    }
}
