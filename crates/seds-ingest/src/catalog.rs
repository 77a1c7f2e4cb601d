//! Discovery of the per-topic "ranked by state" pages from the SEDS index.

use std::collections::BTreeMap;

use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::IngestError;
use crate::extract::{selector, text_of};

/// One discoverable page: a normalized title and its absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
}

impl CatalogEntry {
    /// Title words that must all appear for the entry to be picked.
    pub fn matches(&self, keywords: &[&str]) -> bool {
        keywords.iter().all(|k| self.title.contains(k))
    }
}

/// `"Energy Consumption by Source"` → `"energy_consumption_by_source"`.
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Parse the index page.
///
/// Each `table.contable` row carries one anchor per format; only the anchor
/// whose text is `HTML` is followed, and its `title` attribute names the page.
/// Entries are kept when the title mentions energy and isn't the all-states
/// rollup.
pub fn parse_catalog(html: &str, pages_base: &str) -> Result<Vec<CatalogEntry>, IngestError> {
    let doc = Html::parse_document(html);
    let table = doc
        .select(&selector("table.contable")?)
        .next()
        .ok_or_else(|| IngestError::malformed("catalog", "contents table"))?;

    let tr = selector("tr")?;
    let td = selector("td")?;
    let anchor = selector("a[href]")?;

    let mut entries = BTreeMap::new();
    for row in table.select(&tr) {
        let Some(link) = row
            .select(&anchor)
            .find(|a| text_of(*a).eq_ignore_ascii_case("html"))
        else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        // Link title names the topic; fall back to the row's first cell.
        let raw_title = match link.value().attr("title") {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => row.select(&td).next().map(text_of).unwrap_or_default(),
        };
        let title = normalize_title(&raw_title);
        if !title.contains("energy") || title.contains("all_states") {
            continue;
        }
        entries.entry(title.clone()).or_insert_with(|| CatalogEntry {
            title,
            url: join_url(pages_base, href),
        });
    }
    Ok(entries.into_values().collect())
}

fn join_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        href.trim_start_matches("./").trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
<table class="contable">
  <tr><th>Topic</th><th>Formats</th></tr>
  <tr><td>Consumption</td>
      <td><a href="sep_sum/html/rank_use_source.html" title=" Energy Consumption by Source">
      HTML</a> <a href="x.pdf">PDF</a></td></tr>
  <tr><td>Energy Price and Expenditure</td>
      <td><a href="sep_prices/html/rank_pr.html">HTML</a></td></tr>
  <tr><td>Energy Production, All States</td>
      <td><a href="all.html">HTML</a></td></tr>
  <tr><td>Population</td><td><a href="pop.html">HTML</a></td></tr>
  <tr><td>Energy Sales</td><td><a href="sales.pdf">PDF</a></td></tr>
</table>"#;

    #[test]
    fn title_normalization() {
        assert_eq!(
            normalize_title("  Energy  Consumption by\nSource "),
            "energy_consumption_by_source"
        );
    }

    #[test]
    fn keeps_energy_pages_with_html_links() {
        let entries = parse_catalog(INDEX, "https://www.eia.gov/state/seds/").unwrap();
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            ["energy_consumption_by_source", "energy_price_and_expenditure"]
        );
        assert_eq!(
            entries[0].url,
            "https://www.eia.gov/state/seds/sep_sum/html/rank_use_source.html"
        );
    }

    #[test]
    fn keyword_matching() {
        let entries = parse_catalog(INDEX, "https://example.test").unwrap();
        let hit: Vec<_> = entries
            .iter()
            .filter(|e| e.matches(&["consumption", "source"]))
            .collect();
        assert_eq!(hit.len(), 1);
    }

    #[test]
    fn absolute_links_are_kept() {
        assert_eq!(join_url("https://a.test/x", "https://b.test/y"), "https://b.test/y");
        assert_eq!(join_url("https://a.test/x/", "/y.html"), "https://a.test/x/y.html");
    }

    #[test]
    fn missing_contents_table_is_malformed() {
        assert!(matches!(
            parse_catalog("<p>moved</p>", "https://a.test"),
            Err(IngestError::MalformedSource { .. })
        ));
    }
}
