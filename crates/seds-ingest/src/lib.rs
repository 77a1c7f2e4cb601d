//! Ingestion for SEDS state energy data: fetch, extract, normalize, merge.

pub mod api;
pub mod catalog;
pub mod csv;
pub mod error;
pub mod extract;
#[cfg(feature = "http")]
pub mod http;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod report;

pub use catalog::CatalogEntry;
pub use error::IngestError;
pub use extract::{ScrapedGrid, SourceTable, extract_prices, extract_renewables, parse_grid};
#[cfg(feature = "http")]
pub use http::{FetchConfig, HttpFetcher};
pub use merge::{at_year, filter_state, merge, merge_within};
pub use normalize::{Normalized, SeriesPoint, normalize_series, normalize_table, parse_value};
pub use pipeline::{BILLION_TO_TRILLION, IngestConfig, ScrapeOutput, run_api_ingest, run_scrape};
pub use report::IngestReport;

/// Source of raw page and API text.
pub trait Fetch {
    fn get_text(&self, url: &str) -> Result<String, IngestError>;
}
