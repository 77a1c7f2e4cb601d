use std::fmt;
use std::path::{Path, PathBuf};

use seds_core::{State, Year};

/// Which chart a file holds. Together with the state it fixes the file name,
/// so a rerun overwrites the previous image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Share of total per source across every year.
    Composition,
    /// Raw magnitudes per source in one year.
    SingleYear(Year),
}

impl ChartKind {
    /// `full_yoy_IL.png`, `2017_IL.png`.
    pub fn file_name(self, state: State) -> String {
        format!("{self}_{}.png", state.abbrev())
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Composition => f.write_str("full_yoy"),
            ChartKind::SingleYear(year) => write!(f, "{year}"),
        }
    }
}

pub fn chart_path(dir: &Path, kind: ChartKind, state: State) -> PathBuf {
    dir.join(kind.file_name(state))
}
