//! Storage layer: Parquet files for the snapshot tables, DuckDB for lookups.

mod error;
pub mod files;
pub mod lookup;

pub use error::StoreError;
pub use files::{
    PRICES_PARQUET, RENEWABLES_PARQUET, SNAPSHOT_PARQUET, read_parquet, read_renewables,
    read_snapshot, write_prices, write_renewables, write_snapshot,
};
pub use lookup::{Cell, ComparisonRequest, ComparisonResult, strip_qualifier};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
#[cfg(feature = "duckdb")]
pub use lookup::{LookupError, LookupService};
