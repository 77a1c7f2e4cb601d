//! Table extraction for SEDS "ranked by state" pages.
//!
//! Page layout (only what we rely on):
//! - `table.L2_toggle_table` lists every state as an `<a href>`; those anchor
//!   texts are the valid entity labels.
//! - `table.basic_table.tpl` holds the data grid. Each header `<td colspan="2">`
//!   spans a *(state label, value)* cell pair, and because every column is
//!   ranked independently each pair carries its own state label.
//! - The first `<td>` of every grid row is the rank and is skipped.
//!
//! [`parse_grid`] keeps raw labels and raw cell text. [`SourceTable`] and
//! [`extract_prices`] and [`extract_renewables`] then resolve labels onto
//! canonical states, sources and renewable categories.

use std::collections::{BTreeMap, BTreeSet};

use scraper::{ElementRef, Html, Selector};
use seds_core::{EnergySource, PriceRow, RenewableRow, State};
use tracing::debug;

use crate::IngestError;
use crate::normalize::parse_value;

const ENTITY_TABLE: &str = "table.L2_toggle_table";
const GRID_TABLE: &str = "table.basic_table.tpl";

/// Raw label grid scraped from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedGrid {
    /// Column labels in header order.
    pub labels: Vec<String>,
    /// Entity label → (column label → raw cell text). Entities with no cells are absent.
    pub rows: BTreeMap<String, BTreeMap<String, String>>,
}

pub(crate) fn selector(css: &'static str) -> Result<Selector, IngestError> {
    Selector::parse(css).map_err(|_| IngestError::Selector(css))
}

/// Visible text of an element with whitespace runs collapsed.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the entity list and data grid out of a page.
///
/// `page` only labels errors. Fails with `MalformedSource` when either table
/// is missing, in which case nothing is extracted.
pub fn parse_grid(page: &str, html: &str) -> Result<ScrapedGrid, IngestError> {
    let doc = Html::parse_document(html);

    let entity_table = doc
        .select(&selector(ENTITY_TABLE)?)
        .next()
        .ok_or_else(|| IngestError::malformed(page, "entity list table"))?;
    let grid_table = doc
        .select(&selector(GRID_TABLE)?)
        .next()
        .ok_or_else(|| IngestError::malformed(page, "data grid table"))?;

    let anchor = selector("a[href]")?;
    let entities: BTreeSet<String> = entity_table
        .select(&anchor)
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect();

    let body = grid_table
        .select(&selector("tbody")?)
        .next()
        .unwrap_or(grid_table);

    let td = selector("td")?;
    let labels: Vec<String> = body
        .select(&td)
        .filter(|cell| is_pair_header(*cell))
        .map(text_of)
        .collect();

    let mut rows: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for row in body.select(&selector("tr")?) {
        let cells: Vec<String> = row.select(&td).skip(1).map(text_of).collect();
        match cells.first() {
            Some(first) if entities.contains(first) => {}
            _ => continue,
        }
        for (pair, chunk) in cells.chunks(2).enumerate() {
            let [entity, value] = chunk else { continue };
            let Some(label) = labels.get(pair) else { continue };
            if !entities.contains(entity) {
                continue;
            }
            rows.entry(entity.clone())
                .or_default()
                .insert(label.clone(), value.clone());
        }
    }

    debug!(
        page,
        entities = entities.len(),
        labels = labels.len(),
        rows = rows.len(),
        "parsed grid"
    );
    Ok(ScrapedGrid { labels, rows })
}

/// A header cell whose only attribute is `colspan="2"`.
fn is_pair_header(cell: ElementRef<'_>) -> bool {
    let el = cell.value();
    el.attrs().count() == 1 && el.attr("colspan").map(str::trim) == Some("2")
}

/// Grid resolved onto canonical states and energy sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    pub entries: BTreeMap<State, BTreeMap<EnergySource, String>>,
    /// Entity labels that didn't resolve to a state.
    pub unknown_entities: BTreeSet<String>,
    /// Column labels that aren't one of the tracked sources.
    pub unknown_categories: BTreeSet<String>,
}

impl SourceTable {
    pub fn from_grid(grid: &ScrapedGrid) -> Self {
        let mut table = SourceTable::default();
        for (entity, cells) in &grid.rows {
            let Some(state) = State::resolve(entity) else {
                table.unknown_entities.insert(entity.clone());
                continue;
            };
            let mut sources = BTreeMap::new();
            for (label, raw) in cells {
                match EnergySource::from_label(label) {
                    Some(source) => {
                        sources.insert(source, raw.clone());
                    }
                    None => {
                        table.unknown_categories.insert(label.clone());
                    }
                }
            }
            if sources.is_empty() {
                continue;
            }
            table.entries.entry(state).or_default().extend(sources);
        }
        table
    }

    /// Parse a page straight into source cells.
    pub fn extract(page: &str, html: &str) -> Result<Self, IngestError> {
        Ok(Self::from_grid(&parse_grid(page, html)?))
    }
}

/// Prices per state from a price/expenditure grid.
///
/// Uses the first column whose label mentions "price". Cells that don't parse
/// are skipped and counted in the second return value.
pub fn extract_prices(page: &str, grid: &ScrapedGrid) -> Result<(Vec<PriceRow>, usize), IngestError> {
    let label = grid
        .labels
        .iter()
        .find(|l| l.to_ascii_lowercase().contains("price"))
        .ok_or_else(|| IngestError::malformed(page, "price column"))?;

    let mut prices: BTreeMap<State, f64> = BTreeMap::new();
    let mut unparseable = 0;
    for (entity, cells) in &grid.rows {
        let Some(state) = State::resolve(entity) else {
            continue;
        };
        match cells.get(label).and_then(|raw| parse_value(raw)) {
            Some(price) => {
                prices.insert(state, price);
            }
            None => unparseable += 1,
        }
    }
    let rows = prices
        .into_iter()
        .map(|(state, price)| PriceRow { state, price })
        .collect();
    Ok((rows, unparseable))
}

/// Renewable consumption per state and category from the renewables grid.
///
/// Every column is a category except the renewable total, which the snapshot
/// already carries. Unparseable cells become `None` and are counted in the
/// second return value. Rows come out in state order, then column order.
pub fn extract_renewables(
    page: &str,
    grid: &ScrapedGrid,
) -> Result<(Vec<RenewableRow>, usize), IngestError> {
    let categories: Vec<&String> = grid
        .labels
        .iter()
        .filter(|l| EnergySource::from_label(l).is_none())
        .collect();
    if categories.is_empty() {
        return Err(IngestError::malformed(page, "renewable category columns"));
    }

    let mut by_state: BTreeMap<State, &BTreeMap<String, String>> = BTreeMap::new();
    for (entity, cells) in &grid.rows {
        if let Some(state) = State::resolve(entity) {
            by_state.insert(state, cells);
        }
    }

    let mut rows = Vec::new();
    let mut unparseable = 0;
    for (state, cells) in by_state {
        for category in &categories {
            let value = cells.get(*category).and_then(|raw| parse_value(raw));
            if value.is_none() {
                unparseable += 1;
            }
            rows.push(RenewableRow {
                state,
                category: (*category).clone(),
                value,
            });
        }
    }
    debug!(page, rows = rows.len(), categories = categories.len(), "renewables");
    Ok((rows, unparseable))
}
