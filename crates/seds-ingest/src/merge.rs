//! Inner join of per-source records into wide rows.

use std::collections::BTreeMap;

use seds_core::{EnergySource, OBSERVATION_WINDOW, RawRecord, State, WideRow, Year, YearWindow};
use tracing::debug;

type Key = (State, Year);

/// Usable values per source, keyed by `(state, year)`.
///
/// Null values are dropped here. A later duplicate for the same key replaces
/// an earlier one.
pub fn split_by_source(
    records: impl IntoIterator<Item = RawRecord>,
    window: YearWindow,
) -> BTreeMap<EnergySource, BTreeMap<Key, f64>> {
    let mut by_source: BTreeMap<EnergySource, BTreeMap<Key, f64>> = BTreeMap::new();
    for r in records {
        let Some(value) = r.value else { continue };
        if !window.contains(r.year) {
            continue;
        }
        by_source
            .entry(r.source)
            .or_default()
            .insert((r.state, r.year), value);
    }
    by_source
}

/// Join records on `(state, year)`, keeping only keys every source has.
///
/// Output is ordered by state, then year. If any source has no usable
/// records at all, the result is empty.
pub fn merge(records: impl IntoIterator<Item = RawRecord>) -> Vec<WideRow> {
    merge_within(records, OBSERVATION_WINDOW)
}

pub fn merge_within(
    records: impl IntoIterator<Item = RawRecord>,
    window: YearWindow,
) -> Vec<WideRow> {
    let by_source = split_by_source(records, window);
    let mut tables = Vec::with_capacity(EnergySource::ALL.len());
    for source in EnergySource::ALL {
        match by_source.get(&source) {
            Some(t) if !t.is_empty() => tables.push(t),
            _ => {
                debug!(%source, "no usable records, join is empty");
                return Vec::new();
            }
        }
    }

    let Some((first, rest)) = tables.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .filter_map(|(&(state, year), &v0)| {
            let mut values = [v0; 5];
            for (slot, table) in values[1..].iter_mut().zip(rest) {
                *slot = *table.get(&(state, year))?;
            }
            Some(WideRow::from_values(state, year, values))
        })
        .collect()
}

/// Rows for one state, in year order.
pub fn filter_state(rows: &[WideRow], state: State) -> Vec<WideRow> {
    rows.iter().filter(|r| r.state == state).copied().collect()
}

/// Rows observed in `year`, one per state.
pub fn at_year(rows: &[WideRow], year: Year) -> Vec<WideRow> {
    rows.iter().filter(|r| r.year == year).copied().collect()
}
