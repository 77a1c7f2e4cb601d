//! CSV interchange files.
//!
//! The long-format consumption file is pipe-delimited with header
//! `Year|Consumption|State|Source`; a null consumption is an empty field.
//! Scraped grids are dumped as plain comma CSV for inspection.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Float64Type, Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use seds_core::{EnergySource, RawRecord, State, seds};
use tracing::{info, warn};

use crate::IngestError;
use crate::extract::ScrapedGrid;

pub const DELIMITER: u8 = b'|';

/// Write consumption records to a pipe-delimited CSV, replacing any existing file.
pub fn write_consumption_csv(path: &Path, records: &[RawRecord]) -> Result<(), IngestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let batch = seds::consumption_batch(records)?;
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_delimiter(DELIMITER)
        .build(file);
    writer.write(&batch)?;
    info!(path = %path.display(), rows = records.len(), "wrote consumption csv");
    Ok(())
}

/// Records read back from CSV, with the number of rows that didn't map onto
/// a known state or source.
#[derive(Debug, Default)]
pub struct ConsumptionCsv {
    pub records: Vec<RawRecord>,
    pub skipped: usize,
}

pub fn read_consumption_csv(path: &Path) -> Result<ConsumptionCsv, IngestError> {
    let file = File::open(path)?;
    let reader = ReaderBuilder::new(Arc::new(seds::consumption_schema()))
        .with_header(true)
        .with_delimiter(DELIMITER)
        .build(file)?;

    let mut out = ConsumptionCsv::default();
    for batch in reader {
        read_batch(&batch?, &mut out);
    }
    if out.skipped > 0 {
        warn!(path = %path.display(), skipped = out.skipped, "skipped unrecognised csv rows");
    }
    Ok(out)
}

fn read_batch(batch: &RecordBatch, out: &mut ConsumptionCsv) {
    let years = batch.column(0).as_primitive::<Int32Type>();
    let values = batch.column(1).as_primitive::<Float64Type>();
    let states = batch.column(2).as_string::<i32>();
    let sources = batch.column(3).as_string::<i32>();

    for i in 0..batch.num_rows() {
        let state = State::resolve(states.value(i));
        let source = EnergySource::from_label(sources.value(i));
        let (Some(state), Some(source)) = (state, source) else {
            out.skipped += 1;
            continue;
        };
        let value = values.is_valid(i).then(|| values.value(i));
        out.records
            .push(RawRecord::new(state, source, years.value(i), value));
    }
}

/// Dump a scraped grid as `State,<label>,...`, one row per entity.
pub fn write_grid_csv(path: &Path, grid: &ScrapedGrid) -> Result<(), IngestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut labels: Vec<&String> = Vec::new();
    for label in &grid.labels {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    let mut fields = vec![Field::new("State", DataType::Utf8, false)];
    fields.extend(labels.iter().map(|l| Field::new(l.as_str(), DataType::Utf8, true)));

    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
        grid.rows.keys(),
    ))];
    for label in &labels {
        let column: StringArray = grid
            .rows
            .values()
            .map(|cells| cells.get(*label).map(String::as_str))
            .collect();
        columns.push(Arc::new(column));
    }
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch)?;
    Ok(())
}
