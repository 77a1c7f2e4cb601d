//! The closed set of energy sources tracked per state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Energy source (category) of a consumption figure.
///
/// The set is closed: labels that don't map onto one of these variants are
/// dropped by the ingestion layer, never widened into new columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnergySource {
    Coal,
    NaturalGas,
    Petroleum,
    Nuclear,
    Renewable,
}

impl EnergySource {
    /// All sources in store column order.
    pub const ALL: [EnergySource; 5] = [
        EnergySource::Coal,
        EnergySource::NaturalGas,
        EnergySource::Petroleum,
        EnergySource::Nuclear,
        EnergySource::Renewable,
    ];

    /// Human label, as written in the `Source` column of the consumption CSV.
    pub fn label(self) -> &'static str {
        match self {
            EnergySource::Coal => "Coal",
            EnergySource::NaturalGas => "Natural Gas",
            EnergySource::Petroleum => "Petroleum",
            EnergySource::Nuclear => "Nuclear",
            EnergySource::Renewable => "Renewable Energy",
        }
    }

    /// Column name in the snapshot table.
    pub fn column(self) -> &'static str {
        match self {
            EnergySource::Coal => "coal",
            EnergySource::NaturalGas => "natural_gas",
            EnergySource::Petroleum => "petroleum",
            EnergySource::Nuclear => "nuclear",
            EnergySource::Renewable => "renewable",
        }
    }

    /// SEDS MSN code for total consumption of this source, in billion Btu.
    pub fn series_code(self) -> &'static str {
        match self {
            EnergySource::Coal => "CLTCB",
            EnergySource::NaturalGas => "NNTCB",
            EnergySource::Petroleum => "PMTCB",
            EnergySource::Nuclear => "NUETB",
            EnergySource::Renewable => "RETCB",
        }
    }

    /// Map a free-text label (CSV value, scraped column header, column name)
    /// onto a source. Matching is exact after normalization; a trailing unit in
    /// parentheses (`Coal (trillion Btu)`) is ignored.
    pub fn from_label(label: &str) -> Option<EnergySource> {
        let key = normalize(label);
        let source = match key.as_str() {
            "coal" => EnergySource::Coal,
            "natural gas"
            | "natural gas including supplemental gaseous fuels" => EnergySource::NaturalGas,
            "petroleum" | "petroleum products" | "all petroleum products" => EnergySource::Petroleum,
            "nuclear" | "nuclear power" | "nuclear electric power" => EnergySource::Nuclear,
            "renewable"
            | "renewables"
            | "renewable energy"
            | "total renewable energy"
            | "renewable energy total" => EnergySource::Renewable,
            _ => return None,
        };
        Some(source)
    }
}

fn normalize(label: &str) -> String {
    let mut s = label.replace('_', " ");
    if let Some(open) = s.rfind('(')
        && s.trim_end().ends_with(')')
    {
        s.truncate(open);
    }
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
