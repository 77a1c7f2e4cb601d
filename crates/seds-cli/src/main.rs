mod compare;
mod display;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use seds_chart::{ChartError, write_state_charts};
use seds_core::{RenewableRow, State, WideRow, Year};
use seds_ingest::csv::read_consumption_csv;
use seds_ingest::report::REPORT_FILE;
use seds_ingest::{
    BILLION_TO_TRILLION, FetchConfig, HttpFetcher, IngestConfig, IngestReport, at_year,
    filter_state, merge,
};
use seds_store::{
    ComparisonRequest, DuckStore, LookupService, StoreError, read_renewables, read_snapshot,
    write_prices, write_renewables, write_snapshot,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::compare::{ViewOptions, build_view};

#[derive(Debug, Parser)]
#[command(
    name = "seds",
    version,
    about = "US state energy consumption: ingest, store, chart and compare"
)]
struct Cli {
    #[command(flatten)]
    paths: Paths,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Paths {
    #[arg(long, global = true, env = "SEDS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, global = true, env = "SEDS_DB", default_value = "db.duckdb")]
    db: PathBuf,

    #[arg(long, global = true, env = "SEDS_GRAPHS_DIR", default_value = "static/graphs")]
    graphs_dir: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch every state/source series from the EIA API into the pipe-delimited CSV
    Ingest(SourceArgs),
    /// Scrape the SEDS ranking pages and write the snapshot, price and renewable Parquet files
    Scrape(SourceArgs),
    /// Load the Parquet files into the DuckDB store
    Load,
    /// Render composition and single-year charts for every state
    Charts {
        #[arg(long, default_value_t = 2017)]
        snapshot_year: Year,
    },
    /// Compare one or two states
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    #[arg(long, env = "EIA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "SEDS_API_URL", default_value = "http://api.eia.gov/series/")]
    api_url: String,

    #[arg(
        long,
        env = "SEDS_INDEX_URL",
        default_value = "https://www.eia.gov/state/seds/seds-data-complete.php?sid=US"
    )]
    index_url: String,

    #[arg(long, env = "SEDS_PAGES_URL", default_value = "https://www.eia.gov/state/seds/")]
    pages_url: String,

    #[arg(long, env = "SEDS_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, default_value_t = 2017)]
    snapshot_year: Year,
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Your state (name or abbreviation; "None" for unset)
    #[arg(long)]
    state: Option<String>,

    /// State to compare against
    #[arg(long)]
    compare: Option<String>,

    /// Also list the 1960-2017 composition charts
    #[arg(long)]
    all_years: bool,

    /// Echo the request as JSON
    #[arg(long)]
    show_request: bool,

    #[arg(long, default_value_t = 2017)]
    snapshot_year: Year,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("seds v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Ingest(args) => cmd_ingest(&cli.paths, &args),
        Command::Scrape(args) => cmd_scrape(&cli.paths, &args),
        Command::Load => cmd_load(&cli.paths),
        Command::Charts { snapshot_year } => cmd_charts(&cli.paths, snapshot_year),
        Command::Compare(args) => cmd_compare(&cli.paths, &args),
    }
}

fn ingest_config(paths: &Paths, args: &SourceArgs) -> IngestConfig {
    IngestConfig {
        api_url: args.api_url.clone(),
        api_key: args.api_key.clone(),
        index_url: args.index_url.clone(),
        pages_url: args.pages_url.clone(),
        data_dir: paths.data_dir.clone(),
        snapshot_year: args.snapshot_year,
        ..IngestConfig::default()
    }
}

fn fetcher(args: &SourceArgs) -> anyhow::Result<HttpFetcher> {
    let config = FetchConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        ..FetchConfig::default()
    };
    HttpFetcher::new(&config).context("building HTTP client")
}

fn finish_report(paths: &Paths, mut report: IngestReport) -> anyhow::Result<IngestReport> {
    report.finish();
    let path = paths.data_dir.join(REPORT_FILE);
    report
        .write_json(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(report)
}

fn cmd_ingest(paths: &Paths, args: &SourceArgs) -> anyhow::Result<()> {
    let config = ingest_config(paths, args);
    let fetcher = fetcher(args)?;
    let mut report = IngestReport::begin();
    seds_ingest::run_api_ingest(&fetcher, &config, &mut report).context("API ingest")?;
    let report = finish_report(paths, report)?;
    println!(
        "ingest: {} records -> {} ({} failed series, {} unparseable, {} out of window)",
        report.records_written,
        config.consumption_csv().display(),
        report.failures.len(),
        report.unparseable_values,
        report.out_of_window,
    );
    Ok(())
}

fn cmd_scrape(paths: &Paths, args: &SourceArgs) -> anyhow::Result<()> {
    let config = ingest_config(paths, args);
    let fetcher = fetcher(args)?;
    let mut report = IngestReport::begin();
    let out = seds_ingest::run_scrape(&fetcher, &config, &mut report).context("scrape")?;
    write_snapshot(&paths.data_dir, &out.snapshot).context("writing snapshot parquet")?;
    write_prices(&paths.data_dir, &out.prices).context("writing price parquet")?;
    write_renewables(&paths.data_dir, &out.renewables).context("writing renewable parquet")?;
    let report = finish_report(paths, report)?;
    println!(
        "scrape: {} pages, {} snapshot rows, {} prices, {} renewable cells ({} failed pages, {} unknown entities)",
        out.pages.len(),
        out.snapshot.len(),
        out.prices.len(),
        out.renewables.len(),
        report.failures.len(),
        report.unknown_entities.len(),
    );
    Ok(())
}

fn cmd_load(paths: &Paths) -> anyhow::Result<()> {
    let store = DuckStore::open_persistent(&paths.db)
        .with_context(|| format!("opening {}", paths.db.display()))?;
    store
        .load_all(&paths.data_dir)
        .context("loading parquet into duckdb")?;
    println!(
        "load: {} snapshot rows, {} prices -> {}",
        store.snapshot_count()?,
        store.price_count()?,
        paths.db.display()
    );
    Ok(())
}

fn cmd_charts(paths: &Paths, snapshot_year: Year) -> anyhow::Result<()> {
    let csv_path = IngestConfig {
        data_dir: paths.data_dir.clone(),
        ..IngestConfig::default()
    }
    .consumption_csv();
    let csv = read_consumption_csv(&csv_path)
        .with_context(|| format!("reading {}", csv_path.display()))?;
    let rows = merge(csv.records);

    let snapshot = snapshot_rows(paths, &rows, snapshot_year)?;
    let renewables = renewable_rows(paths)?;

    let states: BTreeSet<State> = rows.iter().map(|r| r.state).collect();
    let mut written = 0;
    for &state in &states {
        let history = filter_state(&rows, state);
        let year_row = snapshot.iter().find(|r| r.state == state);
        match write_state_charts(state, &history, year_row, &renewables, &paths.graphs_dir) {
            Ok(paths) => written += paths.len(),
            Err(e @ ChartError::EmptySeries { .. }) => warn!(%state, error = %e, "skipped"),
            Err(e) => return Err(e).with_context(|| format!("charts for {state}")),
        }
    }
    println!(
        "charts: {written} files for {} states -> {}",
        states.len(),
        paths.graphs_dir.display()
    );
    Ok(())
}

/// Single-year rows in trillion Btu: the scraped snapshot when `scrape` has
/// run, otherwise the API history at that year, converted.
fn snapshot_rows(paths: &Paths, rows: &[WideRow], year: Year) -> anyhow::Result<Vec<WideRow>> {
    match read_snapshot(&paths.data_dir, year) {
        Ok(snapshot) => Ok(snapshot),
        Err(StoreError::NotFound(path)) => {
            warn!(path = %path.display(), "no snapshot parquet, using API series");
            Ok(at_year(rows, year)
                .iter()
                .map(|r| r.scaled(BILLION_TO_TRILLION))
                .collect())
        }
        Err(e) => Err(e).context("reading snapshot parquet"),
    }
}

fn renewable_rows(paths: &Paths) -> anyhow::Result<Vec<RenewableRow>> {
    match read_renewables(&paths.data_dir) {
        Ok(rows) => Ok(rows),
        Err(StoreError::NotFound(path)) => {
            warn!(path = %path.display(), "no renewable parquet, charts get one panel");
            Ok(Vec::new())
        }
        Err(e) => Err(e).context("reading renewable parquet"),
    }
}

fn cmd_compare(paths: &Paths, args: &CompareArgs) -> anyhow::Result<()> {
    let request = ComparisonRequest::from_labels(args.state.as_deref(), args.compare.as_deref());
    let service = LookupService::new(&paths.db);
    let options = ViewOptions {
        all_years: args.all_years,
        show_request: args.show_request,
        graphs_dir: paths.graphs_dir.clone(),
        snapshot_year: args.snapshot_year,
    };
    let view = build_view(&service, &request, &options);

    if let Some(echo) = &view.request_echo {
        println!("request: {echo}");
    }
    if let Some(diagnostic) = &view.diagnostic {
        eprintln!("error: {diagnostic}");
    }
    print!("{}", display::format_table(&view.result));
    for chart in &view.charts {
        println!("{}", chart.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(dir: &std::path::Path) -> Paths {
        Paths {
            data_dir: dir.to_path_buf(),
            db: dir.join("db.duckdb"),
            graphs_dir: dir.join("graphs"),
        }
    }

    fn history() -> Vec<WideRow> {
        let il = State::resolve("IL").unwrap();
        vec![
            WideRow::from_values(il, 2016, [1000.0, 2000.0, 3000.0, 4000.0, 5000.0]),
            WideRow::from_values(il, 2017, [1500.0, 2500.0, 3500.0, 4500.0, 5500.0]),
        ]
    }

    #[test]
    fn single_year_prefers_scraped_snapshot() {
        let tmp = tempfile::TempDir::new().unwrap();
        let il = State::resolve("IL").unwrap();
        let scraped = [WideRow::from_values(il, 2017, [1.0, 2.0, 3.0, 4.0, 5.0])];
        write_snapshot(tmp.path(), &scraped).unwrap();
        let rows = snapshot_rows(&paths(tmp.path()), &history(), 2017).unwrap();
        assert_eq!(rows, scraped);
    }

    #[test]
    fn single_year_falls_back_to_trillion_btu_api_rows() {
        let tmp = tempfile::TempDir::new().unwrap();
        let rows = snapshot_rows(&paths(tmp.path()), &history(), 2017).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2017);
        assert_eq!(rows[0].values(), [1.5, 2.5, 3.5, 4.5, 5.5]);
    }

    #[test]
    fn missing_renewables_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(renewable_rows(&paths(tmp.path())).unwrap().is_empty());
    }
}
