//! DuckDB store holding the snapshot and price tables.

use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use duckdb::Connection;
use seds_core::{PRICE_TABLE, SNAPSHOT_TABLE};
use tracing::info;

use crate::StoreError;
use crate::files::{PRICES_PARQUET, SNAPSHOT_PARQUET};

/// One row per state: the five source columns joined to that state's price.
/// The primary state sorts first.
const COMPARE_SQL: &str = r#"SELECT t.state AS "State",
        t.coal AS "Coal (Tn Btu)",
        t.natural_gas AS "Natural Gas (Tn Btu)",
        t.petroleum AS "Petroleum (Tn Btu)",
        t.nuclear AS "Nuclear (Tn Btu)",
        t.renewable AS "Renewable (Tn Btu)",
        p.prices AS "$/M Btu (all sources)"
    FROM energy_consumption_by_source AS t
    JOIN price_expenditure AS p ON t.state = p.state
    WHERE t.state = ? OR t.state = ?
    ORDER BY CASE WHEN t.state = ? THEN 0 ELSE 1 END"#;

/// DuckDB store for the comparison tables.
///
/// `energy_consumption_by_source` has one row per state with a column per
/// source; `price_expenditure` has `(state, prices)`. Both are imported from
/// Parquet with `CREATE OR REPLACE`, so reloading is idempotent.
///
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for the file-backed database the lookup service reads.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Check whether both tables exist.
    pub fn has_tables(&self) -> bool {
        self.snapshot_count().is_ok() && self.price_count().is_ok()
    }

    pub fn load_snapshot(&self, path: &Path) -> Result<usize, StoreError> {
        self.load_table(SNAPSHOT_TABLE, path)
    }

    pub fn load_prices(&self, path: &Path) -> Result<usize, StoreError> {
        self.load_table(PRICE_TABLE, path)
    }

    /// Load both tables from a data directory holding the Parquet files.
    pub fn load_all(&self, data_dir: &Path) -> Result<(), StoreError> {
        self.load_snapshot(&data_dir.join(SNAPSHOT_PARQUET))?;
        self.load_prices(&data_dir.join(PRICES_PARQUET))?;
        Ok(())
    }

    fn load_table(&self, table: &str, path: &Path) -> Result<usize, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let quoted = path.display().to_string().replace('\'', "''");
        let sql = format!("CREATE OR REPLACE TABLE {table} AS SELECT * FROM read_parquet('{quoted}')");
        self.conn.execute_batch(&sql)?;
        let count = self.count_table(table)?;
        info!(table, count, "loaded table");
        Ok(count)
    }

    // ── Counts ──

    pub fn snapshot_count(&self) -> Result<usize, StoreError> {
        self.count_table(SNAPSHOT_TABLE)
    }

    pub fn price_count(&self) -> Result<usize, StoreError> {
        self.count_table(PRICE_TABLE)
    }

    fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT AS cnt FROM {table}");
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        let batch = batches.first().ok_or(StoreError::NoResults)?;
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<arrow::array::Int64Array>()
            .ok_or_else(|| StoreError::Other("count column not i64".into()))?;
        Ok(col.value(0) as usize)
    }

    // ── Lookup ──

    /// Comparison rows for `primary` and optionally `other`.
    ///
    /// The schema is returned separately so an empty result still has a header.
    pub fn compare(
        &self,
        primary: &str,
        other: Option<&str>,
    ) -> Result<(SchemaRef, Vec<RecordBatch>), StoreError> {
        let other = other.unwrap_or(primary);
        let mut stmt = self.conn.prepare(COMPARE_SQL)?;
        let arrow = stmt.query_arrow([primary, other, primary])?;
        let schema = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();
        Ok((schema, batches))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::files::{write_prices, write_snapshot};
    use seds_core::{PriceRow, State, WideRow};

    /// Writes a three-state snapshot and price table into `dir`.
    pub(crate) fn seed(dir: &Path) {
        let rows: Vec<WideRow> = [("IL", 1.0), ("NY", 2.0), ("TX", 3.0)]
            .iter()
            .map(|(st, k)| {
                WideRow::from_values(
                    State::resolve(st).unwrap(),
                    2017,
                    [100.0 * k, 200.0 * k, 300.0 * k, 40.0 * k, 50.0 * k],
                )
            })
            .collect();
        let prices: Vec<PriceRow> = [("IL", 18.5), ("NY", 22.25), ("TX", 15.0)]
            .iter()
            .map(|(st, p)| PriceRow {
                state: State::resolve(st).unwrap(),
                price: *p,
            })
            .collect();
        write_snapshot(dir, &rows).unwrap();
        write_prices(dir, &prices).unwrap();
    }

    fn loaded() -> (tempfile::TempDir, DuckStore) {
        let tmp = tempfile::TempDir::new().unwrap();
        seed(tmp.path());
        let store = DuckStore::open().unwrap();
        store.load_all(tmp.path()).unwrap();
        (tmp, store)
    }

    fn rows(batches: &[RecordBatch]) -> usize {
        batches.iter().map(|b| b.num_rows()).sum()
    }

    #[test]
    fn fresh_store_has_no_tables() {
        let store = DuckStore::open().unwrap();
        assert!(!store.has_tables());
        assert!(store.snapshot_count().is_err());
    }

    #[test]
    fn load_missing_file_errors() {
        let store = DuckStore::open().unwrap();
        let result = store.load_snapshot(Path::new("/nonexistent/file.parquet"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn load_all_counts() {
        let (_tmp, store) = loaded();
        assert!(store.has_tables());
        assert_eq!(store.snapshot_count().unwrap(), 3);
        assert_eq!(store.price_count().unwrap(), 3);
    }

    #[test]
    fn reload_replaces_tables() {
        let (tmp, store) = loaded();
        store.load_all(tmp.path()).unwrap();
        assert_eq!(store.snapshot_count().unwrap(), 3);
    }

    #[test]
    fn compare_two_states_primary_first() {
        let (_tmp, store) = loaded();
        let (schema, batches) = store.compare("NY", Some("IL")).unwrap();
        assert_eq!(schema.fields().len(), 7);
        assert_eq!(schema.field(0).name(), "State");
        assert_eq!(rows(&batches), 2);
        let first = batches.iter().find(|b| b.num_rows() > 0).unwrap();
        let state = arrow::util::display::array_value_to_string(first.column(0), 0).unwrap();
        assert_eq!(state, "NY");
    }

    #[test]
    fn compare_single_state() {
        let (_tmp, store) = loaded();
        let (_, batches) = store.compare("TX", None).unwrap();
        assert_eq!(rows(&batches), 1);
    }

    #[test]
    fn compare_unknown_state_keeps_schema() {
        let (_tmp, store) = loaded();
        let (schema, batches) = store.compare("ZZ", None).unwrap();
        assert_eq!(rows(&batches), 0);
        assert_eq!(schema.field(6).name(), "$/M Btu (all sources)");
    }

    #[test]
    fn compare_without_tables_errors() {
        let store = DuckStore::open().unwrap();
        assert!(store.compare("IL", None).is_err());
    }

    #[test]
    fn persistent_load_and_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        seed(tmp.path());
        let db_path = tmp.path().join("test.duckdb");

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert!(!store.has_tables());
        store.load_all(tmp.path()).unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert!(store.has_tables());
        assert_eq!(store.price_count().unwrap(), 3);
    }
}
