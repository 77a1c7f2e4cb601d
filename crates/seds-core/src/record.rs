//! Typed records flowing through the pipeline.

use serde::{Deserialize, Serialize};

use crate::{EnergySource, State};

pub type Year = i32;

/// Inclusive range of observation years.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub first: Year,
    pub last: Year,
}

/// Window of the primary SEDS consumption dataset.
pub const OBSERVATION_WINDOW: YearWindow = YearWindow {
    first: 1960,
    last: 2017,
};

impl YearWindow {
    pub fn contains(&self, year: Year) -> bool {
        (self.first..=self.last).contains(&year)
    }
}

/// One observed fact: a state's consumption of one source in one year.
///
/// `value` is `None` when the source cell was missing or not numeric; such
/// records are kept for auditing but never take part in a join.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub state: State,
    pub source: EnergySource,
    pub year: Year,
    pub value: Option<f64>,
}

impl RawRecord {
    pub fn new(state: State, source: EnergySource, year: Year, value: Option<f64>) -> Self {
        Self {
            state,
            source,
            year,
            value,
        }
    }
}

/// One row of the wide table: every source populated for `(state, year)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub state: State,
    pub year: Year,
    pub coal: f64,
    pub natural_gas: f64,
    pub petroleum: f64,
    pub nuclear: f64,
    pub renewable: f64,
}

impl WideRow {
    /// Build a row from values laid out in [`EnergySource::ALL`] order.
    pub fn from_values(state: State, year: Year, values: [f64; 5]) -> Self {
        let [coal, natural_gas, petroleum, nuclear, renewable] = values;
        Self {
            state,
            year,
            coal,
            natural_gas,
            petroleum,
            nuclear,
            renewable,
        }
    }

    pub fn value(&self, source: EnergySource) -> f64 {
        match source {
            EnergySource::Coal => self.coal,
            EnergySource::NaturalGas => self.natural_gas,
            EnergySource::Petroleum => self.petroleum,
            EnergySource::Nuclear => self.nuclear,
            EnergySource::Renewable => self.renewable,
        }
    }

    /// Values in [`EnergySource::ALL`] order.
    pub fn values(&self) -> [f64; 5] {
        EnergySource::ALL.map(|s| self.value(s))
    }

    pub fn total(&self) -> f64 {
        self.values().iter().sum()
    }

    /// Same row with every value multiplied by `factor` (unit conversion).
    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_values(self.state, self.year, self.values().map(|v| v * factor))
    }
}

/// Average price across all sources, dollars per million Btu.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub state: State,
    pub price: f64,
}

/// One renewable category for one state in the snapshot year, trillion Btu.
///
/// Categories are the column labels of the renewable consumption page as
/// published (hydroelectric, wind, biomass, ...). `value` is `None` when the
/// cell was suppressed or not numeric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenewableRow {
    pub state: State,
    pub category: String,
    pub value: Option<f64>,
}
