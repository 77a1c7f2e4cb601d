//! Batch drivers: one sequential pass over every source, best effort.
//!
//! A failure scoped to one page or series is recorded in the report and the
//! run moves on. Anything else (disk I/O, a missing API key) aborts the run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use seds_core::{
    EnergySource, OBSERVATION_WINDOW, PriceRow, RawRecord, RenewableRow, State, WideRow, Year,
    YearWindow,
};
use tracing::{info, warn};

use crate::api::{parse_series, series_id, series_url};
use crate::catalog::{CatalogEntry, parse_catalog};
use crate::csv::{read_consumption_csv, write_consumption_csv, write_grid_csv};
use crate::extract::{ScrapedGrid, SourceTable, extract_prices, extract_renewables, parse_grid};
use crate::merge::{at_year, merge_within};
use crate::normalize::{normalize_series, normalize_table};
use crate::report::IngestReport;
use crate::{Fetch, IngestError};

pub const CONSUMPTION_CSV: &str = "energy_consumption_by_source_1960_2017.csv";
pub const SCRAPED_DIR: &str = "scraped";

/// API series are in billion Btu; scraped tables and the store use trillion Btu.
pub const BILLION_TO_TRILLION: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub index_url: String,
    /// Base for every relative link in the catalog.
    pub pages_url: String,
    pub data_dir: PathBuf,
    pub states: Vec<State>,
    pub window: YearWindow,
    pub snapshot_year: Year,
    /// Title words identifying the consumption-by-source page.
    pub consumption_keywords: Vec<String>,
    pub price_keywords: Vec<String>,
    pub renewable_keywords: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_url: "http://api.eia.gov/series/".into(),
            api_key: None,
            index_url: "https://www.eia.gov/state/seds/seds-data-complete.php?sid=US".into(),
            pages_url: "https://www.eia.gov/state/seds/".into(),
            data_dir: PathBuf::from("data"),
            states: State::all().collect(),
            window: OBSERVATION_WINDOW,
            snapshot_year: 2017,
            consumption_keywords: vec!["consumption".into(), "source".into()],
            price_keywords: vec!["price".into()],
            renewable_keywords: vec!["renewable".into()],
        }
    }
}

impl IngestConfig {
    pub fn consumption_csv(&self) -> PathBuf {
        self.data_dir.join(CONSUMPTION_CSV)
    }

    pub fn scraped_dir(&self) -> PathBuf {
        self.data_dir.join(SCRAPED_DIR)
    }
}

/// Fetch every `(source, state)` series and write the long-format CSV.
pub fn run_api_ingest(
    fetcher: &impl Fetch,
    config: &IngestConfig,
    report: &mut IngestReport,
) -> Result<Vec<RawRecord>, IngestError> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(IngestError::MissingApiKey)?;

    let mut records = Vec::new();
    for source in EnergySource::ALL {
        for &state in &config.states {
            let id = series_id(state, source);
            let url = series_url(&config.api_url, api_key, state, source);
            let points = match fetcher
                .get_text(&url)
                .and_then(|body| parse_series(&id, &body))
            {
                Ok(points) => points,
                Err(e) if e.is_source_local() => {
                    report.record_failure(id, &e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let normalized = normalize_series(state, source, &points, config.window);
            report.absorb_counts(&normalized);
            records.extend(normalized.records);
        }
        info!(%source, records = records.len(), "series fetched");
    }

    write_consumption_csv(&config.consumption_csv(), &records)?;
    report.records_written += records.len();
    Ok(records)
}

/// Tables built from the scraped pages, ready to persist.
#[derive(Debug, Default)]
pub struct ScrapeOutput {
    pub pages: Vec<CatalogEntry>,
    pub snapshot: Vec<WideRow>,
    pub prices: Vec<PriceRow>,
    /// Per-category renewable consumption in the snapshot year.
    pub renewables: Vec<RenewableRow>,
}

/// Discover, fetch and dump every catalog page, then build the snapshot,
/// price and renewable tables from their pages.
pub fn run_scrape(
    fetcher: &impl Fetch,
    config: &IngestConfig,
    report: &mut IngestReport,
) -> Result<ScrapeOutput, IngestError> {
    let catalog = match fetcher
        .get_text(&config.index_url)
        .and_then(|html| parse_catalog(&html, &config.pages_url))
    {
        Ok(catalog) => catalog,
        Err(e) if e.is_source_local() => {
            report.record_failure("catalog", &e);
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    info!(pages = catalog.len(), "catalog discovered");

    let mut grids: BTreeMap<String, ScrapedGrid> = BTreeMap::new();
    let mut pages = Vec::new();
    for entry in catalog {
        let grid = match fetcher
            .get_text(&entry.url)
            .and_then(|html| parse_grid(&entry.title, &html))
        {
            Ok(grid) => grid,
            Err(e) if e.is_source_local() => {
                report.record_failure(&entry.title, &e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let path = config.scraped_dir().join(format!("{}.csv", entry.title));
        write_grid_csv(&path, &grid)?;
        info!(page = %entry.title, entities = grid.rows.len(), "scraped");
        grids.insert(entry.title.clone(), grid);
        pages.push(entry);
    }

    let consumption = find_page(&pages, &grids, &config.consumption_keywords);
    let mut snapshot = match consumption {
        Some((_, grid)) => snapshot_from_grid(grid, config, report),
        None => Vec::new(),
    };
    if snapshot.is_empty() {
        snapshot = snapshot_from_api(config)?;
    }
    report.wide_rows += snapshot.len();

    let prices = match find_page(&pages, &grids, &config.price_keywords) {
        Some((title, grid)) => match extract_prices(title, grid) {
            Ok((prices, unparseable)) => {
                report.unparseable_values += unparseable;
                prices
            }
            Err(e) => {
                report.record_failure(title, &e);
                Vec::new()
            }
        },
        None => {
            warn!("no price page in catalog");
            Vec::new()
        }
    };
    report.prices += prices.len();

    let renewables = match find_page(&pages, &grids, &config.renewable_keywords) {
        Some((title, grid)) => match extract_renewables(title, grid) {
            Ok((rows, unparseable)) => {
                report.unparseable_values += unparseable;
                rows
            }
            Err(e) => {
                report.record_failure(title, &e);
                Vec::new()
            }
        },
        None => {
            warn!("no renewable consumption page in catalog");
            Vec::new()
        }
    };
    report.renewables += renewables.len();

    Ok(ScrapeOutput {
        pages,
        snapshot,
        prices,
        renewables,
    })
}

fn find_page<'a>(
    pages: &'a [CatalogEntry],
    grids: &'a BTreeMap<String, ScrapedGrid>,
    keywords: &[String],
) -> Option<(&'a str, &'a ScrapedGrid)> {
    let keywords: Vec<&str> = keywords.iter().map(String::as_str).collect();
    pages
        .iter()
        .filter(|p| p.matches(&keywords))
        .find_map(|p| Some((p.title.as_str(), grids.get(&p.title)?)))
}

fn snapshot_from_grid(
    grid: &ScrapedGrid,
    config: &IngestConfig,
    report: &mut IngestReport,
) -> Vec<WideRow> {
    let table = SourceTable::from_grid(grid);
    report.absorb_table(&table);
    let normalized = normalize_table(&table, config.snapshot_year, config.window);
    report.absorb_counts(&normalized);
    let rows = merge_within(normalized.records, config.window);
    info!(rows = rows.len(), year = config.snapshot_year, "snapshot from scraped page");
    rows
}

/// Snapshot from the API-derived CSV, if an earlier `ingest` run left one.
fn snapshot_from_api(config: &IngestConfig) -> Result<Vec<WideRow>, IngestError> {
    let path = config.consumption_csv();
    if !path.exists() {
        warn!(path = %path.display(), "no scraped snapshot and no API csv, snapshot is empty");
        return Ok(Vec::new());
    }
    let csv = read_consumption_csv(&path)?;
    let rows = merge_within(csv.records, config.window);
    let snapshot: Vec<WideRow> = at_year(&rows, config.snapshot_year)
        .iter()
        .map(|r| r.scaled(BILLION_TO_TRILLION))
        .collect();
    warn!(rows = snapshot.len(), "snapshot falls back to API series");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct FakeFetcher(HashMap<String, String>);

    impl Fetch for FakeFetcher {
        fn get_text(&self, url: &str) -> Result<String, IngestError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| IngestError::Server {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn st(s: &str) -> State {
        State::resolve(s).unwrap()
    }

    fn config(dir: &std::path::Path) -> IngestConfig {
        IngestConfig {
            api_url: "http://api.test/series/".into(),
            api_key: Some("k".into()),
            index_url: "http://eia.test/index".into(),
            pages_url: "http://eia.test/seds/".into(),
            data_dir: dir.to_path_buf(),
            states: vec![st("IL"), st("NY")],
            ..IngestConfig::default()
        }
    }

    fn series_body(points: &[(i32, f64)]) -> String {
        let data: Vec<String> = points
            .iter()
            .map(|(y, v)| format!(r#"["{y}", {v}]"#))
            .collect();
        format!(r#"{{"series":[{{"data":[{}]}}]}}"#, data.join(","))
    }

    fn api_fixture(config: &IngestConfig, skip_ny_nuclear: bool) -> HashMap<String, String> {
        let mut pages = HashMap::new();
        for (i, source) in EnergySource::ALL.iter().enumerate() {
            for state in &config.states {
                if skip_ny_nuclear
                    && state.abbrev() == "NY"
                    && *source == EnergySource::Nuclear
                {
                    continue;
                }
                let base = 1000.0 * (i + 1) as f64;
                pages.insert(
                    series_url(&config.api_url, "k", *state, *source),
                    series_body(&[(1959, 1.0), (2016, base), (2017, base + 500.0)]),
                );
            }
        }
        pages
    }

    #[test]
    fn api_ingest_writes_csv_and_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let fetcher = FakeFetcher(api_fixture(&config, true));
        let mut report = IngestReport::begin();

        let records = run_api_ingest(&fetcher, &config, &mut report).unwrap();
        // 2 states x 5 sources, one series missing, 2 in-window points each.
        assert_eq!(records.len(), 18);
        assert_eq!(report.out_of_window, 9);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "SEDS.NUETB.NY.A");

        let back = read_consumption_csv(&config.consumption_csv()).unwrap();
        assert_eq!(back.records, records);
    }

    #[test]
    fn api_ingest_needs_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig {
            api_key: None,
            ..config(dir.path())
        };
        let fetcher = FakeFetcher(HashMap::new());
        let err = run_api_ingest(&fetcher, &config, &mut IngestReport::begin()).unwrap_err();
        assert!(matches!(err, IngestError::MissingApiKey));
    }

    const INDEX: &str = r#"
<table class="contable">
  <tr><td><a href="sep_sum/html/rank_use_source.html" title="Energy Consumption by Source">HTML</a></td></tr>
  <tr><td><a href="sep_prices/html/rank_pr.html" title="Energy Prices and Expenditures">HTML</a></td></tr>
  <tr><td><a href="sep_prod/html/broken.html" title="Energy Production">HTML</a></td></tr>
  <tr><td><a href="sep_sum/html/rank_use_renew.html" title="Renewable Energy Consumption">HTML</a></td></tr>
</table>"#;

    const CONSUMPTION: &str = r#"
<table class="L2_toggle_table">
  <tr><td><a href="a">Illinois</a></td></tr>
  <tr><td><a href="b">New York</a></td></tr>
</table>
<table class="basic_table tpl"><tbody>
  <tr><td></td><td colspan="2">Coal</td><td colspan="2">Natural Gas</td><td colspan="2">Petroleum</td><td colspan="2">Nuclear Electric Power</td><td colspan="2">Renewable Energy</td></tr>
  <tr><td>1</td><td>Illinois</td><td>1,000</td><td>New York</td><td>1,200</td><td>Illinois</td><td>1,300</td><td>Illinois</td><td>1,000</td><td>Illinois</td><td>200</td></tr>
  <tr><td>2</td><td>New York</td><td>100</td><td>Illinois</td><td>900</td><td>New York</td><td>1,100</td><td>New York</td><td>450</td><td>New York</td><td>(s)</td></tr>
</tbody></table>"#;

    const PRICES: &str = r#"
<table class="L2_toggle_table">
  <tr><td><a href="a">Illinois</a></td></tr>
  <tr><td><a href="b">New York</a></td></tr>
</table>
<table class="basic_table tpl"><tbody>
  <tr><td></td><td colspan="2">Prices</td><td colspan="2">Expenditures</td></tr>
  <tr><td>1</td><td>New York</td><td>22.5</td><td>New York</td><td>60,000</td></tr>
  <tr><td>2</td><td>Illinois</td><td>18.0</td><td>Illinois</td><td>40,000</td></tr>
</tbody></table>"#;

    const RENEWABLES: &str = r#"
<table class="L2_toggle_table">
  <tr><td><a href="a">Illinois</a></td></tr>
  <tr><td><a href="b">New York</a></td></tr>
</table>
<table class="basic_table tpl"><tbody>
  <tr><td></td><td colspan="2">Renewable energy</td><td colspan="2">Hydroelectric power</td><td colspan="2">Wind</td></tr>
  <tr><td>1</td><td>Illinois</td><td>200</td><td>New York</td><td>250</td><td>Illinois</td><td>130</td></tr>
  <tr><td>2</td><td>New York</td><td>(s)</td><td>Illinois</td><td>1.2</td><td>New York</td><td>40</td></tr>
</tbody></table>"#;

    fn scrape_fixture(config: &IngestConfig) -> HashMap<String, String> {
        HashMap::from([
            (config.index_url.clone(), INDEX.to_string()),
            (
                "http://eia.test/seds/sep_sum/html/rank_use_source.html".to_string(),
                CONSUMPTION.to_string(),
            ),
            (
                "http://eia.test/seds/sep_prices/html/rank_pr.html".to_string(),
                PRICES.to_string(),
            ),
            (
                "http://eia.test/seds/sep_sum/html/rank_use_renew.html".to_string(),
                RENEWABLES.to_string(),
            ),
            (
                "http://eia.test/seds/sep_prod/html/broken.html".to_string(),
                "<p>no tables</p>".to_string(),
            ),
        ])
    }

    #[test]
    fn scrape_builds_snapshot_and_prices() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let fetcher = FakeFetcher(scrape_fixture(&config));
        let mut report = IngestReport::begin();

        let out = run_scrape(&fetcher, &config, &mut report).unwrap();
        assert_eq!(out.pages.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "energy_production");

        // New York's renewable cell is suppressed, so only Illinois joins.
        assert_eq!(out.snapshot.len(), 1);
        let il = out.snapshot[0];
        assert_eq!(il.state, st("IL"));
        assert_eq!(il.year, 2017);
        assert_eq!(il.values(), [1000.0, 900.0, 1300.0, 1000.0, 200.0]);
        assert_eq!(report.unparseable_values, 1);

        assert_eq!(out.prices.len(), 2);
        assert_eq!(out.prices[0].state, st("IL"));
        assert_eq!(out.prices[0].price, 18.0);

        // Two states x two categories; the renewable total column is not a category.
        assert_eq!(out.renewables.len(), 4);
        assert_eq!(report.renewables, 4);
        assert_eq!(out.renewables[0].category, "Hydroelectric power");
        assert_eq!(out.renewables[0].value, Some(1.2));
        assert_eq!(out.renewables[3].category, "Wind");
        assert_eq!(out.renewables[3].value, Some(40.0));

        let dumped = config
            .scraped_dir()
            .join("energy_consumption_by_source.csv");
        assert!(dumped.exists());
    }

    #[test]
    fn snapshot_falls_back_to_api_csv() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let api = FakeFetcher(api_fixture(&config, false));
        run_api_ingest(&api, &config, &mut IngestReport::begin()).unwrap();

        // Catalog unreachable: no scraped pages at all.
        let offline = FakeFetcher(HashMap::new());
        let mut report = IngestReport::begin();
        let out = run_scrape(&offline, &config, &mut report).unwrap();
        assert_eq!(report.failures[0].source, "catalog");
        assert!(out.prices.is_empty());

        assert_eq!(out.snapshot.len(), 2);
        assert!(out.snapshot.iter().all(|r| r.year == 2017));
        // 2017 coal is 1500 billion Btu.
        assert!((out.snapshot[0].coal - 1.5).abs() < 1e-9);
    }
}
