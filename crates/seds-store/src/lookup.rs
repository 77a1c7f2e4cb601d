//! State comparison lookup: zero, one or two states in, header + rows out.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use seds_core::State;
use serde::Serialize;

use crate::StoreError;

/// The states a caller asked about. Built per request, never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonRequest {
    #[serde(rename = "your_state", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "comparison_state", skip_serializing_if = "Option::is_none")]
    pub compare: Option<String>,
}

impl ComparisonRequest {
    /// Blank labels and the `None` placeholder count as unset. Names resolve to
    /// abbreviations; anything unrecognised is passed through and matches nothing.
    pub fn from_labels(state: Option<&str>, compare: Option<&str>) -> Self {
        Self {
            state: state.and_then(selection),
            compare: compare.and_then(selection),
        }
    }

    /// Primary state and optional second state, or `None` when nothing is selected.
    pub fn pair(&self) -> Option<(&str, Option<&str>)> {
        match (self.state.as_deref(), self.compare.as_deref()) {
            (Some(a), b) => Some((a, b)),
            (None, Some(b)) => Some((b, None)),
            (None, None) => None,
        }
    }

    /// Selected states in request order.
    pub fn selected(&self) -> Vec<&str> {
        self.state
            .iter()
            .chain(self.compare.iter())
            .map(String::as_str)
            .collect()
    }
}

fn selection(label: &str) -> Option<String> {
    let label = label.trim();
    if label.is_empty() || label == "None" {
        return None;
    }
    Some(match State::resolve(label) {
        Some(state) => state.abbrev().to_string(),
        None => label.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Null => Ok(()),
        }
    }
}

/// Header plus rows, columns in query order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ComparisonResult {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Self, StoreError> {
        let header = schema
            .fields()
            .iter()
            .map(|f| strip_qualifier(f.name()).to_string())
            .collect();
        let mut rows = Vec::new();
        for batch in batches {
            for i in 0..batch.num_rows() {
                let row = batch
                    .columns()
                    .iter()
                    .map(|col| cell(col, i))
                    .collect::<Result<Vec<_>, _>>()?;
                rows.push(row);
            }
        }
        Ok(Self { header, rows })
    }
}

/// `table.column` → `column`.
pub fn strip_qualifier(name: &str) -> &str {
    name.split_once('.').map_or(name, |(_, column)| column)
}

fn cell(col: &ArrayRef, i: usize) -> Result<Cell, StoreError> {
    if col.is_null(i) {
        return Ok(Cell::Null);
    }
    Ok(match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(i).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(i).to_string()),
        DataType::Utf8View => Cell::Text(col.as_string_view().value(i).to_string()),
        DataType::Float64 => Cell::Number(col.as_primitive::<Float64Type>().value(i)),
        _ => Cell::Text(array_value_to_string(col, i)?),
    })
}

#[cfg(feature = "duckdb")]
pub use service::{LookupError, LookupService};

#[cfg(feature = "duckdb")]
mod service {
    use std::path::PathBuf;

    use thiserror::Error;
    use tracing::debug;

    use super::{ComparisonRequest, ComparisonResult};
    use crate::{DuckStore, StoreError};

    #[derive(Debug, Error)]
    pub enum LookupError {
        #[error("lookup query failed: {0}")]
        QueryFailure(#[from] StoreError),
    }

    /// Read-only lookups against a persisted DuckDB file. Each call opens its
    /// own connection and drops it before returning.
    #[derive(Debug, Clone)]
    pub struct LookupService {
        db_path: PathBuf,
    }

    impl LookupService {
        pub fn new(db_path: impl Into<PathBuf>) -> Self {
            Self {
                db_path: db_path.into(),
            }
        }

        pub fn lookup(&self, request: &ComparisonRequest) -> Result<ComparisonResult, LookupError> {
            let Some((primary, other)) = request.pair() else {
                return Ok(ComparisonResult::default());
            };
            // Opening a missing path would create an empty database.
            if !self.db_path.exists() {
                return Err(StoreError::NotFound(self.db_path.clone()).into());
            }
            let store = DuckStore::open_persistent(&self.db_path)?;
            if !store.has_tables() {
                return Err(StoreError::NotLoaded(self.db_path.clone()).into());
            }
            let (schema, batches) = store.compare(primary, other)?;
            let result = ComparisonResult::from_batches(&schema, &batches)?;
            debug!(primary, ?other, rows = result.rows.len(), "lookup");
            Ok(result)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::duck::tests::seed;
        use crate::lookup::Cell;

        fn service() -> (tempfile::TempDir, LookupService) {
            let tmp = tempfile::TempDir::new().unwrap();
            seed(tmp.path());
            let db = tmp.path().join("db.duckdb");
            let store = DuckStore::open_persistent(&db).unwrap();
            store.load_all(tmp.path()).unwrap();
            drop(store);
            (tmp, LookupService::new(db))
        }

        #[test]
        fn both_unset_is_empty_without_query() {
            let svc = LookupService::new("/nonexistent/db.duckdb");
            let req = ComparisonRequest::from_labels(Some("None"), None);
            let result = svc.lookup(&req).unwrap();
            assert!(result.header.is_empty());
            assert!(result.rows.is_empty());
        }

        #[test]
        fn two_states_return_two_rows_with_header() {
            let (_tmp, svc) = service();
            let req = ComparisonRequest::from_labels(Some("IL"), Some("NY"));
            let result = svc.lookup(&req).unwrap();
            assert_eq!(
                result.header,
                [
                    "State",
                    "Coal (Tn Btu)",
                    "Natural Gas (Tn Btu)",
                    "Petroleum (Tn Btu)",
                    "Nuclear (Tn Btu)",
                    "Renewable (Tn Btu)",
                    "$/M Btu (all sources)",
                ]
            );
            assert_eq!(result.rows.len(), 2);
            assert_eq!(result.rows[0][0], Cell::Text("IL".into()));
            assert_eq!(result.rows[0][1], Cell::Number(100.0));
            assert_eq!(result.rows[0][6], Cell::Number(18.5));
            assert_eq!(result.rows[1][0], Cell::Text("NY".into()));
        }

        #[test]
        fn one_state_returns_one_row() {
            let (_tmp, svc) = service();
            let req = ComparisonRequest::from_labels(None, Some("Texas"));
            let result = svc.lookup(&req).unwrap();
            assert_eq!(result.rows.len(), 1);
            assert_eq!(result.rows[0][0], Cell::Text("TX".into()));
        }

        #[test]
        fn missing_store_is_query_failure() {
            let tmp = tempfile::TempDir::new().unwrap();
            let db = tmp.path().join("absent.duckdb");
            let svc = LookupService::new(&db);
            let req = ComparisonRequest::from_labels(Some("IL"), None);
            assert!(matches!(svc.lookup(&req), Err(LookupError::QueryFailure(_))));
            assert!(!db.exists());
        }

        #[test]
        fn store_without_tables_is_query_failure() {
            let tmp = tempfile::TempDir::new().unwrap();
            let db = tmp.path().join("empty.duckdb");
            drop(DuckStore::open_persistent(&db).unwrap());
            let svc = LookupService::new(&db);
            let req = ComparisonRequest::from_labels(Some("IL"), None);
            let err = svc.lookup(&req).unwrap_err();
            assert!(matches!(
                err,
                LookupError::QueryFailure(StoreError::NotLoaded(_))
            ));
            assert!(err.to_string().contains("no comparison tables"));
        }
    }
}
