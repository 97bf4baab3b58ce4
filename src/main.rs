//! CLI entry point for the tank history tool.
//!
//! Loads a tank's gas-level history from a file, a URL or the dashboard
//! API, aggregates it over a trailing period, and logs, exports or
//! batch-summarizes the result.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use tank_history::{
    analyzers::{analyzer::analyze_history, period::Period},
    batch::summarize_tanks,
    chart::build_report,
    config::{HistoryConfig, Zone},
    fetch::{client_with_token, fetch_bytes, token_for},
    infra::tank_api::TankApiClient,
    output::{append_record, print_json, print_pretty, print_summary, write_series_csv},
    parser::{load_readings, normalize_readings},
    reading::Reading,
    services::history_api::HistoryApi,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const TANK_SOURCE_PREFIX: &str = "tank:";

#[derive(Parser)]
#[command(name = "tank_history")]
#[command(about = "Aggregate and summarize tank gas-level history", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Zone for hour/day buckets and labels: local, utc, an offset like +02:00,
    /// or an IANA name like Europe/Madrid
    #[arg(long, global = true)]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one tank's history and log the chart series and statistics
    Analyze {
        /// History file, http(s) URL, or tank:<id> to fetch from the API
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Trailing period: 24h, 7d, 30d or all
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Tank capacity in liters, used for the current fill level
        #[arg(long)]
        capacity: Option<f64>,

        /// Tank id to show in the report (defaults to the id in tank:<id>)
        #[arg(long)]
        tank_id: Option<String>,

        /// How to print the report
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Reference instant for the period window (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Write a tank's chart series to CSV
    Export {
        /// History file, http(s) URL, or tank:<id> to fetch from the API
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Trailing period: 24h, 7d, 30d or all
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Output file (defaults to tank_history_<date>.csv)
        #[arg(short, long)]
        output: Option<String>,

        /// Gzip compress the CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Reference instant for the period window (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Summarize several tanks from the API into one CSV row each
    Batch {
        /// Comma separated tank ids
        #[arg(long, value_delimiter = ',', required = true)]
        tanks: Vec<String>,

        /// Trailing period: 24h, 7d, 30d or all
        #[arg(short, long, default_value = "30d")]
        period: Period,

        /// Maximum number of concurrent history downloads
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,

        /// CSV file to append summary rows to
        #[arg(short, long, default_value = "tank_summaries.csv")]
        output: String,

        /// Reference instant for the period window (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Headline numbers only
    Summary,
    /// Full report in Rust debug form (debug level)
    Pretty,
    /// Full report as JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HistoryConfig::load(path)?,
        None => HistoryConfig::default(),
    }
    .with_env_overrides(|key| std::env::var(key).ok());
    if let Some(timezone) = cli.timezone {
        config.timezone = timezone;
    }
    config.validate()?;

    match config.zone()? {
        Zone::Local => run(cli.command, &config, Local).await,
        Zone::Utc => run(cli.command, &config, Utc).await,
        Zone::Fixed(offset) => run(cli.command, &config, offset).await,
        Zone::Named(zone) => run(cli.command, &config, zone).await,
    }
}

/// Colored stderr plus a JSON rolling log file. The returned guard must be
/// held until exit so buffered file lines are flushed.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/tank_history.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("tank_history.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

async fn run<Tz>(command: Commands, config: &HistoryConfig, tz: Tz) -> Result<()>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Display + Send + Sync,
{
    let policy = config.trend_policy();

    match command {
        Commands::Analyze {
            source,
            period,
            capacity,
            tank_id,
            format,
            now,
        } => {
            let now = now.unwrap_or_else(Utc::now);
            let readings = fetcher(&source, config, &tz).await?;
            let analysis = analyze_history(&readings, period, now, &tz, &policy);

            let tank_id = tank_id.or_else(|| source_tank_id(&source).map(str::to_string));
            let report = build_report(&analysis, tank_id.as_deref(), capacity, &tz);

            match format {
                OutputFormat::Summary => print_summary(&report),
                OutputFormat::Pretty => {
                    print_summary(&report);
                    print_pretty(&report);
                }
                OutputFormat::Json => print_json(&report)?,
            }
        }
        Commands::Export {
            source,
            period,
            output,
            gzip,
            now,
        } => {
            let now = now.unwrap_or_else(Utc::now);
            let readings = fetcher(&source, config, &tz).await?;
            let analysis = analyze_history(&readings, period, now, &tz, &policy);
            let report = build_report(&analysis, source_tank_id(&source), None, &tz);

            let output = output.unwrap_or_else(|| default_export_path(now, &tz, gzip));
            write_series_csv(&output, &report.points, gzip)
                .with_context(|| format!("failed to write series to '{output}'"))?;
            info!(output = %output, rows = report.points.len(), gzip, "Series exported");
        }
        Commands::Batch {
            tanks,
            period,
            concurrency,
            output,
            now,
        } => {
            let now = now.unwrap_or_else(Utc::now);
            let api: Arc<dyn HistoryApi> = Arc::new(tank_api(config)?);

            info!(tanks = tanks.len(), concurrency, period = %period, "Starting batch");
            let rows = summarize_tanks(api, &tanks, period, now, &tz, policy, concurrency).await;

            for row in &rows {
                append_record(&output, row)
                    .with_context(|| format!("failed to append summary to '{output}'"))?;
            }
            info!(output = %output, rows = rows.len(), "Batch summaries written");
        }
    }

    Ok(())
}

/// Loads readings from `tank:<id>`, an http(s) URL, or a local file.
///
/// The API token is only sent to the configured API, never to arbitrary
/// URLs.
#[tracing::instrument(skip_all, fields(source = %source))]
async fn fetcher<Tz: TimeZone>(source: &str, config: &HistoryConfig, tz: &Tz) -> Result<Vec<Reading>> {
    if let Some(tank_id) = source_tank_id(source) {
        let raw = tank_api(config)?.tank_history(tank_id).await?;
        return Ok(normalize_readings(&raw, tz));
    }

    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let token = token_for(config.api_url.as_deref(), source, config.api_token.as_deref());
        let client = client_with_token(token)?;
        fetch_bytes(client.as_ref(), source).await?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read history file '{source}'"))?
    };

    load_readings(&bytes, tz)
}

fn source_tank_id(source: &str) -> Option<&str> {
    source.strip_prefix(TANK_SOURCE_PREFIX)
}

fn tank_api(config: &HistoryConfig) -> Result<TankApiClient> {
    let api_url = config
        .api_url
        .as_deref()
        .context("no API URL configured; set TANK_API_URL or api_url in the config file")?;
    TankApiClient::new(api_url, config.api_token.as_deref())
}

fn default_export_path<Tz>(now: DateTime<Utc>, tz: &Tz, gzip: bool) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = now.with_timezone(tz).format("%Y-%m-%d");
    if gzip {
        format!("tank_history_{date}.csv.gz")
    } else {
        format!("tank_history_{date}.csv")
    }
}
