//! Raw cell text → typed records.

use seds_core::{EnergySource, RawRecord, State, Year, YearWindow};

use crate::extract::SourceTable;

/// Markers SEDS uses in place of a number.
const NOT_A_NUMBER: &[&str] = &["NA", "(s)", "W", "--", "-", "(D)", "(NA)"];

/// Parse a numeric cell. Thousands separators and surrounding whitespace are
/// ignored; suppression markers and anything non-finite yield `None`.
pub fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NOT_A_NUMBER.contains(&trimmed) {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Records plus the counts of what had to be dropped or nulled on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<RawRecord>,
    /// Cells kept as null records because the value didn't parse.
    pub unparseable: usize,
    /// Observations dropped for falling outside the window.
    pub out_of_window: usize,
}

impl Normalized {
    pub fn extend(&mut self, other: Normalized) {
        self.records.extend(other.records);
        self.unparseable += other.unparseable;
        self.out_of_window += other.out_of_window;
    }
}

/// Normalize one extracted page as observations for `year`.
pub fn normalize_table(table: &SourceTable, year: Year, window: YearWindow) -> Normalized {
    let mut out = Normalized::default();
    if !window.contains(year) {
        out.out_of_window = table.entries.values().map(|m| m.len()).sum();
        return out;
    }
    for (state, cells) in &table.entries {
        for (source, raw) in cells {
            let value = parse_value(raw);
            if value.is_none() {
                out.unparseable += 1;
            }
            out.records.push(RawRecord::new(*state, *source, year, value));
        }
    }
    out
}

/// One `(year, value)` point from an API series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub year: Year,
    pub value: Option<f64>,
}

/// Normalize an API series for one state and source.
pub fn normalize_series(
    state: State,
    source: EnergySource,
    points: &[SeriesPoint],
    window: YearWindow,
) -> Normalized {
    let mut out = Normalized::default();
    for point in points {
        if !window.contains(point.year) {
            out.out_of_window += 1;
            continue;
        }
        if point.value.is_none() {
            out.unparseable += 1;
        }
        out.records
            .push(RawRecord::new(state, source, point.year, point.value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::CONSUMPTION_PAGE;
    use seds_core::OBSERVATION_WINDOW;

    #[test]
    fn parses_thousands_separators() {
        assert_eq!(parse_value("1,012.5"), Some(1012.5));
        assert_eq!(parse_value(" 28,000 "), Some(28000.0));
        assert_eq!(parse_value("-3.25"), Some(-3.25));
    }

    #[test]
    fn markers_and_garbage_are_none() {
        for raw in ["", "NA", "(s)", "W", "--", "abc", "inf", "NaN"] {
            assert_eq!(parse_value(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn table_keeps_unparseable_cells_as_nulls() {
        let table = SourceTable::extract("test", CONSUMPTION_PAGE).unwrap();
        let n = normalize_table(&table, 2017, OBSERVATION_WINDOW);
        assert_eq!(n.records.len(), 4);
        assert_eq!(n.unparseable, 1);
        let ny = State::resolve("NY").unwrap();
        let coal = n
            .records
            .iter()
            .find(|r| r.state == ny && r.source == EnergySource::Coal)
            .unwrap();
        assert_eq!(coal.value, None);
        assert!(n.records.iter().all(|r| r.year == 2017));
    }

    #[test]
    fn table_outside_window_is_dropped() {
        let table = SourceTable::extract("test", CONSUMPTION_PAGE).unwrap();
        let n = normalize_table(&table, 2030, OBSERVATION_WINDOW);
        assert!(n.records.is_empty());
        assert_eq!(n.out_of_window, 4);
    }

    #[test]
    fn series_filters_window_and_counts_nulls() {
        let al = State::resolve("AL").unwrap();
        let points = [
            SeriesPoint { year: 1959, value: Some(1.0) },
            SeriesPoint { year: 1960, value: Some(2.0) },
            SeriesPoint { year: 2017, value: None },
            SeriesPoint { year: 2018, value: Some(3.0) },
        ];
        let n = normalize_series(al, EnergySource::Nuclear, &points, OBSERVATION_WINDOW);
        assert_eq!(n.records.len(), 2);
        assert_eq!(n.out_of_window, 2);
        assert_eq!(n.unparseable, 1);
        assert_eq!(n.records[0], RawRecord::new(al, EnergySource::Nuclear, 1960, Some(2.0)));
    }
}
