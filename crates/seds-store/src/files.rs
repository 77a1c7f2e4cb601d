//! Parquet files for the snapshot, price and renewable tables.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use seds_core::{
    PRICE_TABLE, PriceRow, RENEWABLE_TABLE, RenewableRow, SNAPSHOT_TABLE, WideRow, Year, seds,
};
use tracing::info;

use crate::StoreError;

pub const SNAPSHOT_PARQUET: &str = "energy_consumption_by_source.parquet";
pub const PRICES_PARQUET: &str = "price_expenditure.parquet";
pub const RENEWABLES_PARQUET: &str = "renewable_energy_consumption.parquet";

/// Write one batch to a Parquet file, replacing it.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Write the wide snapshot (one row per state) into `data_dir`.
pub fn write_snapshot(data_dir: &Path, rows: &[WideRow]) -> Result<PathBuf, StoreError> {
    let path = data_dir.join(SNAPSHOT_PARQUET);
    write_parquet(&path, &seds::snapshot_batch(rows)?)?;
    info!(table = SNAPSHOT_TABLE, rows = rows.len(), path = %path.display(), "wrote parquet");
    Ok(path)
}

pub fn write_prices(data_dir: &Path, rows: &[PriceRow]) -> Result<PathBuf, StoreError> {
    let path = data_dir.join(PRICES_PARQUET);
    write_parquet(&path, &seds::price_batch(rows)?)?;
    info!(table = PRICE_TABLE, rows = rows.len(), path = %path.display(), "wrote parquet");
    Ok(path)
}

pub fn write_renewables(data_dir: &Path, rows: &[RenewableRow]) -> Result<PathBuf, StoreError> {
    let path = data_dir.join(RENEWABLES_PARQUET);
    write_parquet(&path, &seds::renewable_batch(rows)?)?;
    info!(table = RENEWABLE_TABLE, rows = rows.len(), path = %path.display(), "wrote parquet");
    Ok(path)
}

/// Snapshot rows from `data_dir`, stamped with the year they were built for.
pub fn read_snapshot(data_dir: &Path, year: Year) -> Result<Vec<WideRow>, StoreError> {
    let mut rows = Vec::new();
    for batch in read_parquet(&data_dir.join(SNAPSHOT_PARQUET))? {
        rows.extend(seds::snapshot_rows(&batch, year)?);
    }
    Ok(rows)
}

pub fn read_renewables(data_dir: &Path) -> Result<Vec<RenewableRow>, StoreError> {
    let mut rows = Vec::new();
    for batch in read_parquet(&data_dir.join(RENEWABLES_PARQUET))? {
        rows.extend(seds::renewable_rows(&batch)?);
    }
    Ok(rows)
}
