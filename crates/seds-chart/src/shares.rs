//! Proportions for the composition chart.

use seds_core::{EnergySource, WideRow, Year};

/// Bottom-to-top stacking order, also the bar order.
pub const STACK_ORDER: [EnergySource; 5] = [
    EnergySource::Nuclear,
    EnergySource::Petroleum,
    EnergySource::NaturalGas,
    EnergySource::Coal,
    EnergySource::Renewable,
];

/// One year's share of total per source, in [`STACK_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shares {
    pub year: Year,
    pub shares: [f64; 5],
}

/// Normalize each row so its sources sum to 1.
///
/// Negative values count as zero. Rows with nothing left to divide by are
/// skipped rather than drawn as an empty column.
pub fn composition(rows: &[WideRow]) -> Vec<Shares> {
    rows.iter()
        .filter_map(|row| {
            let values = STACK_ORDER.map(|s| row.value(s).max(0.0));
            let total: f64 = values.iter().sum();
            if total <= 0.0 || !total.is_finite() {
                return None;
            }
            Some(Shares {
                year: row.year,
                shares: values.map(|v| v / total),
            })
        })
        .collect()
}
