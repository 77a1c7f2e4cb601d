/// Table names in the relational store.
pub const SNAPSHOT_TABLE: &str = "energy_consumption_by_source";
pub const PRICE_TABLE: &str = "price_expenditure";
pub const RENEWABLE_TABLE: &str = "renewable_energy_consumption";

/// Arrow schema definitions and batch builders for SEDS data.
pub mod seds {
    use std::sync::Arc;

    use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Float64Type, Schema};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;

    use crate::{EnergySource, PriceRow, RawRecord, RenewableRow, State, WideRow, Year};

    /// Long format, one row per `(year, state, source)` observation.
    /// Column order is the on-disk order of the pipe-delimited CSV.
    pub fn consumption_schema() -> Schema {
        Schema::new(vec![
            Field::new("Year", DataType::Int32, false),
            Field::new("Consumption", DataType::Float64, true),
            Field::new("State", DataType::Utf8, false),
            Field::new("Source", DataType::Utf8, false),
        ])
    }

    /// Wide snapshot: one row per state, one column per source.
    pub fn snapshot_schema() -> Schema {
        let mut fields = vec![Field::new("state", DataType::Utf8, false)];
        fields.extend(
            EnergySource::ALL
                .iter()
                .map(|s| Field::new(s.column(), DataType::Float64, false)),
        );
        Schema::new(fields)
    }

    pub fn price_schema() -> Schema {
        Schema::new(vec![
            Field::new("state", DataType::Utf8, false),
            Field::new("prices", DataType::Float64, false),
        ])
    }

    /// Long format, one row per `(state, renewable category)`.
    pub fn renewable_schema() -> Schema {
        Schema::new(vec![
            Field::new("state", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("consumption", DataType::Float64, true),
        ])
    }

    pub fn consumption_batch(records: &[RawRecord]) -> Result<RecordBatch, ArrowError> {
        let years = Int32Array::from_iter_values(records.iter().map(|r| r.year));
        let values: Float64Array = records.iter().map(|r| r.value).collect();
        let states = StringArray::from_iter_values(records.iter().map(|r| r.state.abbrev()));
        let sources = StringArray::from_iter_values(records.iter().map(|r| r.source.label()));
        RecordBatch::try_new(
            Arc::new(consumption_schema()),
            vec![
                Arc::new(years),
                Arc::new(values),
                Arc::new(states),
                Arc::new(sources),
            ],
        )
    }

    pub fn snapshot_batch(rows: &[WideRow]) -> Result<RecordBatch, ArrowError> {
        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.state.abbrev()),
        ))];
        for source in EnergySource::ALL {
            columns.push(Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.value(source)),
            )));
        }
        RecordBatch::try_new(Arc::new(snapshot_schema()), columns)
    }

    pub fn price_batch(rows: &[PriceRow]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Arc::new(price_schema()),
            vec![
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.state.abbrev()))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.price))),
            ],
        )
    }

    pub fn renewable_batch(rows: &[RenewableRow]) -> Result<RecordBatch, ArrowError> {
        let values: Float64Array = rows.iter().map(|r| r.value).collect();
        RecordBatch::try_new(
            Arc::new(renewable_schema()),
            vec![
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.state.abbrev()))),
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.category.as_str()))),
                Arc::new(values),
            ],
        )
    }

    fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, ArrowError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| ArrowError::SchemaError(format!("missing column {name}")))
    }

    fn state_at(states: &StringArray, i: usize) -> Result<State, ArrowError> {
        let raw = states.value(i);
        State::resolve(raw).ok_or_else(|| ArrowError::ParseError(format!("unknown state {raw:?}")))
    }

    /// Read snapshot rows back. The table has no year column, so the caller
    /// supplies the year it was built for.
    pub fn snapshot_rows(batch: &RecordBatch, year: Year) -> Result<Vec<WideRow>, ArrowError> {
        let states = column(batch, "state")?
            .as_string_opt::<i32>()
            .ok_or_else(|| ArrowError::CastError("state column is not utf8".into()))?;
        let mut values = Vec::with_capacity(EnergySource::ALL.len());
        for source in EnergySource::ALL {
            let array = column(batch, source.column())?
                .as_primitive_opt::<Float64Type>()
                .ok_or_else(|| ArrowError::CastError(format!("{} is not float64", source.column())))?;
            values.push(array);
        }
        (0..batch.num_rows())
            .map(|i| {
                let state = state_at(states, i)?;
                let row: [f64; 5] = std::array::from_fn(|k| values[k].value(i));
                Ok(WideRow::from_values(state, year, row))
            })
            .collect()
    }

    pub fn renewable_rows(batch: &RecordBatch) -> Result<Vec<RenewableRow>, ArrowError> {
        let states = column(batch, "state")?
            .as_string_opt::<i32>()
            .ok_or_else(|| ArrowError::CastError("state column is not utf8".into()))?;
        let categories = column(batch, "category")?
            .as_string_opt::<i32>()
            .ok_or_else(|| ArrowError::CastError("category column is not utf8".into()))?;
        let values = column(batch, "consumption")?
            .as_primitive_opt::<Float64Type>()
            .ok_or_else(|| ArrowError::CastError("consumption is not float64".into()))?;
        (0..batch.num_rows())
            .map(|i| {
                Ok(RenewableRow {
                    state: state_at(states, i)?,
                    category: categories.value(i).to_string(),
                    value: values.is_valid(i).then(|| values.value(i)),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::seds;
    use crate::{EnergySource, RawRecord, RenewableRow, State, WideRow};

    #[test]
    fn consumption_schema_matches_csv_header() {
        let schema = seds::consumption_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["Year", "Consumption", "State", "Source"]);
        assert!(schema.field_with_name("Consumption").unwrap().is_nullable());
    }

    #[test]
    fn snapshot_schema_has_state_and_sources() {
        let schema = seds::snapshot_schema();
        assert_eq!(schema.fields().len(), 6);
        assert_eq!(schema.field(0).name(), "state");
        assert!(schema.field_with_name("natural_gas").is_ok());
    }

    #[test]
    fn consumption_batch_keeps_nulls() {
        let ny = State::resolve("NY").unwrap();
        let records = [
            RawRecord::new(ny, EnergySource::Coal, 2016, Some(10.0)),
            RawRecord::new(ny, EnergySource::Coal, 2017, None),
        ];
        let batch = seds::consumption_batch(&records).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn snapshot_batch_one_row_per_state() {
        let il = State::resolve("IL").unwrap();
        let rows = [WideRow::from_values(il, 2017, [1.0, 2.0, 3.0, 4.0, 5.0])];
        let batch = seds::snapshot_batch(&rows).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 6);
    }

    #[test]
    fn snapshot_rows_take_the_given_year() {
        let ny = State::resolve("NY").unwrap();
        let rows = [WideRow::from_values(ny, 2017, [6.0, 7.0, 8.0, 9.0, 10.0])];
        let batch = seds::snapshot_batch(&rows).unwrap();
        assert_eq!(seds::snapshot_rows(&batch, 2017).unwrap(), rows);
        assert_eq!(seds::snapshot_rows(&batch, 2016).unwrap()[0].year, 2016);
    }

    #[test]
    fn renewable_rows_keep_suppressed_cells() {
        let il = State::resolve("IL").unwrap();
        let rows = vec![
            RenewableRow { state: il, category: "Wind".into(), value: Some(120.5) },
            RenewableRow { state: il, category: "Solar".into(), value: None },
        ];
        let batch = seds::renewable_batch(&rows).unwrap();
        assert_eq!(batch.column(2).null_count(), 1);
        assert_eq!(seds::renewable_rows(&batch).unwrap(), rows);
    }
}
