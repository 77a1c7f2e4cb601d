//! Run report: what an ingest run produced and what it had to skip.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::IngestError;
use crate::extract::SourceTable;
use crate::normalize::Normalized;

pub const REPORT_FILE: &str = "ingest_report.json";

/// A source that failed without aborting the run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records_written: usize,
    pub wide_rows: usize,
    pub prices: usize,
    pub renewables: usize,
    pub unknown_entities: BTreeSet<String>,
    pub unknown_categories: BTreeSet<String>,
    pub unparseable_values: usize,
    pub out_of_window: usize,
    pub failures: Vec<SourceFailure>,
}

impl IngestReport {
    pub fn begin() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            records_written: 0,
            wide_rows: 0,
            prices: 0,
            renewables: 0,
            unknown_entities: BTreeSet::new(),
            unknown_categories: BTreeSet::new(),
            unparseable_values: 0,
            out_of_window: 0,
            failures: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn record_failure(&mut self, source: impl Into<String>, error: &IngestError) {
        let source = source.into();
        warn!(%source, %error, "source failed, continuing");
        self.failures.push(SourceFailure {
            source,
            error: error.to_string(),
        });
    }

    pub fn absorb_table(&mut self, table: &SourceTable) {
        self.unknown_entities
            .extend(table.unknown_entities.iter().cloned());
        self.unknown_categories
            .extend(table.unknown_categories.iter().cloned());
    }

    pub fn absorb_counts(&mut self, normalized: &Normalized) {
        self.unparseable_values += normalized.unparseable;
        self.out_of_window += normalized.out_of_window;
    }

    pub fn write_json(&self, path: &Path) -> Result<(), IngestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
