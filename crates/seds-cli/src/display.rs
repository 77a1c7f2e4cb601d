//! Aligned table rendering for comparison results.

use seds_store::{Cell, ComparisonResult};

/// Render a result as a left-aligned text table with a rule under the header.
/// Numbers are right-aligned.
pub fn format_table(result: &ComparisonResult) -> String {
    if result.header.is_empty() {
        return String::new();
    }
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(format_cell).collect())
        .collect();

    let mut widths: Vec<usize> = result.header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = result
        .header
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for (row, raw) in cells.iter().zip(&result.rows) {
        let line: Vec<String> = row
            .iter()
            .zip(raw)
            .zip(&widths)
            .map(|((text, cell), w)| match cell {
                Cell::Number(_) => format!("{text:>w$}"),
                _ => format!("{text:<w$}"),
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) => format!("{n:.2}"),
        Cell::Text(s) => s.clone(),
        Cell::Null => "-".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_renders_nothing() {
        assert_eq!(format_table(&ComparisonResult::default()), "");
    }

    #[test]
    fn columns_are_aligned() {
        let result = ComparisonResult {
            header: vec!["State".into(), "Coal (Tn Btu)".into()],
            rows: vec![
                vec![Cell::Text("IL".into()), Cell::Number(1012.5)],
                vec![Cell::Text("NY".into()), Cell::Null],
            ],
        };
        let table = format_table(&result);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "State  Coal (Tn Btu)");
        assert_eq!(lines[1], "-----  -------------");
        assert_eq!(lines[2], "IL           1012.50");
        assert_eq!(lines[3], "NY     -");
    }
}
