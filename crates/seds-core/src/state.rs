//! Canonical state identities.
//!
//! Every source (API series ids, scraped page labels, CSV rows, store keys)
//! refers to a state differently: the API wants `IL`, the HTML tables say
//! `Illinois`, sometimes with stray whitespace. [`State`] is the one key they
//! all resolve to. The canonical key is the two-letter postal abbreviation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// `(abbreviation, name)`, sorted by abbreviation. The index is the [`State`] id.
const STATES: &[(&str, &str)] = &[
    ("AK", "Alaska"),
    ("AL", "Alabama"),
    ("AR", "Arkansas"),
    ("AZ", "Arizona"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("IA", "Iowa"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("ME", "Maine"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("MS", "Mississippi"),
    ("MT", "Montana"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("NE", "Nebraska"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NV", "Nevada"),
    ("NY", "New York"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VA", "Virginia"),
    ("VT", "Vermont"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("WV", "West Virginia"),
    ("WY", "Wyoming"),
];

/// Extra spellings seen in EIA tables that don't match the canonical name.
const ALIASES: &[(&str, &str)] = &[
    ("washington, d.c.", "DC"),
    ("washington dc", "DC"),
    ("d.c.", "DC"),
];

/// A U.S. state (or the District of Columbia).
///
/// Ordering follows the abbreviation, so sorted output is stable across runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown state: {0:?}")]
pub struct UnknownState(pub String);

impl State {
    /// Two-letter postal abbreviation, e.g. `IL`.
    pub fn abbrev(self) -> &'static str {
        STATES[self.0 as usize].0
    }

    /// Full name, e.g. `Illinois`.
    pub fn name(self) -> &'static str {
        STATES[self.0 as usize].1
    }

    /// All 51 entities in abbreviation order.
    pub fn all() -> impl Iterator<Item = State> {
        (0..STATES.len()).map(|i| State(i as u8))
    }

    /// Resolve a free-text label (full name or abbreviation) to a state.
    ///
    /// Case-insensitive; internal whitespace runs collapse to one space.
    /// Returns `None` for anything that isn't exactly one state, including
    /// national and regional totals like "United States".
    pub fn resolve(label: &str) -> Option<State> {
        let key = normalize_label(label);
        if key.is_empty() {
            return None;
        }
        if let Some(&(_, abbrev)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
            return Self::from_abbrev(abbrev);
        }
        STATES
            .iter()
            .position(|(abbrev, name)| key.eq_ignore_ascii_case(abbrev) || key.eq_ignore_ascii_case(name))
            .map(|i| State(i as u8))
    }

    fn from_abbrev(abbrev: &str) -> Option<State> {
        STATES
            .binary_search_by(|(a, _)| (*a).cmp(abbrev))
            .ok()
            .map(|i| State(i as u8))
    }
}

/// Lowercase and collapse whitespace (non-breaking spaces included).
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

impl FromStr for State {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::resolve(s).ok_or_else(|| UnknownState(s.to_string()))
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.abbrev())
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
