//! Raster rendering onto an RGB canvas, written as PNG.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use seds_core::{EnergySource, RenewableRow, State, WideRow, Year};
use tracing::{debug, info};

use crate::ChartError;
use crate::kind::{ChartKind, chart_path};
use crate::shares::{STACK_ORDER, Shares, composition};
use crate::text;

const WIDTH: u32 = 880;
const LEFT: u32 = 80;
const RIGHT: u32 = 30;

const BACKGROUND: Rgb<u8> = Rgb([0xf0, 0xf0, 0xf0]);
const GRID: Rgb<u8> = Rgb([0xcb, 0xcb, 0xcb]);
const AXIS: Rgb<u8> = Rgb([0x3c, 0x3c, 0x3c]);
const INK: Rgb<u8> = Rgb([0x22, 0x22, 0x22]);
const ALPHA: f64 = 0.5;

const TITLE_Y: i64 = 12;
const LEGEND_Y: u32 = 38;

fn color(source: EnergySource) -> Rgb<u8> {
    match source {
        EnergySource::Nuclear => Rgb([0xe5, 0xae, 0x38]),
        EnergySource::Petroleum => Rgb([0x30, 0xa2, 0xda]),
        EnergySource::NaturalGas => Rgb([0xfc, 0x4f, 0x30]),
        EnergySource::Coal => Rgb([0x8b, 0x8b, 0x8b]),
        EnergySource::Renewable => Rgb([0x28, 0xb4, 0x63]),
    }
}

/// Source color composited over the background at [`ALPHA`].
fn fill(source: EnergySource) -> Rgb<u8> {
    let c = color(source);
    Rgb(std::array::from_fn(|i| {
        (BACKGROUND[i] as f64 * (1.0 - ALPHA) + c[i] as f64 * ALPHA).round() as u8
    }))
}

/// Plot area rows; `bottom` is the baseline.
#[derive(Debug, Clone, Copy)]
struct Panel {
    top: u32,
    bottom: u32,
}

impl Panel {
    /// Pixel row for a fraction of the panel height, 0 at the baseline.
    fn y_at(self, fraction: f64) -> u32 {
        let h = (self.bottom - self.top) as f64;
        (self.bottom as f64 - fraction.clamp(0.0, 1.0) * h).round() as u32
    }

    fn mid(self) -> u32 {
        (self.top + self.bottom) / 2
    }
}

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    fn new(height: u32) -> Self {
        Self {
            img: RgbImage::from_pixel(WIDTH, height, BACKGROUND),
        }
    }

    fn plot_width(&self) -> u32 {
        WIDTH - LEFT - RIGHT
    }

    fn put(&mut self, x: u32, y: u32, c: Rgb<u8>) {
        if x < self.img.width() && y < self.img.height() {
            self.img.put_pixel(x, y, c);
        }
    }

    fn hline(&mut self, y: u32, c: Rgb<u8>) {
        for x in LEFT..WIDTH - RIGHT {
            self.put(x, y, c);
        }
    }

    fn vspan(&mut self, panel: Panel, x: u32, from: f64, to: f64, c: Rgb<u8>) {
        for y in panel.y_at(to)..panel.y_at(from) {
            self.put(x, y, c);
        }
    }

    fn rect(&mut self, panel: Panel, x0: u32, x1: u32, from: f64, to: f64, c: Rgb<u8>) {
        for x in x0..x1 {
            self.vspan(panel, x, from, to, c);
        }
    }

    fn text(&mut self, x: i64, y: i64, s: &str) {
        text::draw(&mut self.img, x, y, s, 1, INK);
    }

    /// Text centered on column `x`.
    fn text_centered(&mut self, x: u32, y: u32, s: &str) {
        let left = x as i64 - (text::width(s, 1) / 2) as i64;
        self.text(left, y as i64, s);
    }

    fn title(&mut self, s: &str) {
        let left = (WIDTH as i64 - text::width(s, 2) as i64) / 2;
        text::draw(&mut self.img, left.max(0), TITLE_Y, s, 2, INK);
    }

    /// Gridlines with tick labels at quarters of the panel height.
    fn y_ticks(&mut self, panel: Panel, label: impl Fn(f64) -> String) {
        for step in 0..=4 {
            let fraction = step as f64 / 4.0;
            let y = panel.y_at(fraction);
            if step > 0 {
                self.hline(y, GRID);
            }
            let s = label(fraction);
            let left = LEFT as i64 - 6 - text::width(&s, 1) as i64;
            self.text(left, y as i64 - 4, &s);
        }
    }

    /// Axis title running up the left margin, centered on the panel.
    fn y_label(&mut self, panel: Panel, s: &str) {
        let bottom = panel.mid() as i64 + (text::width(s, 1) / 2) as i64;
        text::draw_vertical(&mut self.img, 8, bottom, s, INK);
    }

    /// Tick mark and label under the baseline at column `x`.
    fn x_tick(&mut self, panel: Panel, x: u32, s: &str) {
        for y in panel.bottom..panel.bottom + 4 {
            self.put(x, y, AXIS);
        }
        self.text_centered(x, panel.bottom + 8, s);
    }

    fn axes(&mut self, panel: Panel) {
        self.hline(panel.bottom, AXIS);
        for y in panel.top..=panel.bottom {
            self.put(LEFT - 1, y, AXIS);
        }
    }

    /// Named color key, top of the stack first.
    fn legend(&mut self) {
        let swatch = 10;
        let entries: Vec<EnergySource> = STACK_ORDER.iter().rev().copied().collect();
        let total: u32 = entries
            .iter()
            .map(|s| swatch + 4 + text::width(s.label(), 1) + 16)
            .sum();
        let mut x = (WIDTH.saturating_sub(total)) / 2;
        for source in entries {
            for px in x..x + swatch {
                for py in LEGEND_Y..LEGEND_Y + swatch {
                    self.put(px, py, fill(source));
                }
            }
            self.text((x + swatch + 4) as i64, (LEGEND_Y + 1) as i64, source.label());
            x += swatch + 4 + text::width(source.label(), 1) + 16;
        }
    }

    fn save(self, path: &Path) -> Result<(), ChartError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.img.save(path)?;
        Ok(())
    }
}

/// Shares at pixel column `x`, interpolated between neighbouring years.
fn shares_at(series: &[Shares], x: f64) -> [f64; 5] {
    let (first, last) = match (series.first(), series.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return [0.0; 5],
    };
    if series.len() == 1 {
        return first.shares;
    }
    let year = first.year as f64 + x * (last.year - first.year) as f64;
    let idx = series
        .windows(2)
        .position(|w| year <= w[1].year as f64)
        .unwrap_or(series.len() - 2);
    let (a, b) = (series[idx], series[idx + 1]);
    let span = (b.year - a.year) as f64;
    let t = if span > 0.0 {
        ((year - a.year as f64) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    std::array::from_fn(|k| a.shares[k] + (b.shares[k] - a.shares[k]) * t)
}

/// Decades inside `[first, last]`, plus `last` when it isn't crowded by one.
fn year_ticks(first: Year, last: Year) -> Vec<Year> {
    let mut ticks: Vec<Year> = (first..=last).filter(|y| y % 10 == 0).collect();
    match ticks.last() {
        Some(&end) if last - end < 4 => {}
        _ => ticks.push(last),
    }
    if ticks.first() != Some(&first) && ticks.first().is_none_or(|&y| y - first >= 4) {
        ticks.insert(0, first);
    }
    ticks
}

/// Stacked area chart of each source's share of total, years in order.
pub fn render_composition(state: State, rows: &[WideRow], path: &Path) -> Result<(), ChartError> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|r| r.year);
    let series = composition(&rows);
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(ChartError::EmptySeries {
            state: state.to_string(),
        });
    };
    let (first, last) = (first.year, last.year);

    let panel = Panel { top: 64, bottom: 430 };
    let mut canvas = Canvas::new(480);
    canvas.title(&format!("Energy Consumption by Source ({first}-{last}): {state}"));
    canvas.legend();
    canvas.y_ticks(panel, |f| format!("{:.0}%", f * 100.0));
    canvas.y_label(panel, "Share of Total Consumption");

    let width = canvas.plot_width();
    for px in 0..width {
        let x = px as f64 / (width - 1).max(1) as f64;
        let shares = shares_at(&series, x);
        let mut base = 0.0;
        for (k, source) in STACK_ORDER.iter().enumerate() {
            let top = base + shares[k];
            canvas.vspan(panel, LEFT + px, base, top, fill(*source));
            base = top;
        }
    }
    canvas.axes(panel);
    for year in year_ticks(first, last) {
        let span = (last - first).max(1) as f64;
        let x = LEFT + (((year - first) as f64 / span) * (width - 1) as f64).round() as u32;
        canvas.x_tick(panel, x, &year.to_string());
    }
    canvas.save(path)?;
    debug!(%state, years = series.len(), path = %path.display(), "composition chart");
    Ok(())
}

/// One labelled bar per entry, scaled to the largest value. `None` leaves an
/// empty slot with its label.
fn bar_panel(
    canvas: &mut Canvas,
    panel: Panel,
    bars: &[(String, Option<f64>, Rgb<u8>)],
    y_label: &str,
) {
    let max = bars
        .iter()
        .filter_map(|(_, v, _)| *v)
        .fold(0.0_f64, |m, v| m.max(v));
    canvas.y_ticks(panel, |f| format!("{:.0}", f * max));
    canvas.y_label(panel, y_label);

    let slot = canvas.plot_width() / bars.len().max(1) as u32;
    let pad = slot / 6;
    for (k, (label, value, c)) in bars.iter().enumerate() {
        let x0 = LEFT + k as u32 * slot;
        let center = x0 + slot / 2;
        if let Some(v) = value {
            let height = if max > 0.0 { v.max(0.0) / max } else { 0.0 };
            canvas.rect(panel, x0 + pad, x0 + slot - pad, 0.0, height, *c);
            let value_text = format!("{v:.1}");
            let above = panel.y_at(height).saturating_sub(12).max(panel.top);
            canvas.text_centered(center, above, &value_text);
        }
        canvas.x_tick(panel, center, text::fit(label, slot.saturating_sub(4)));
    }
    canvas.axes(panel);
}

/// Bar chart of consumption per source for one row, with a second panel
/// breaking renewables down by category when `renewables` has any for the
/// row's state. Values are trillion Btu.
pub fn render_single_year(
    row: &WideRow,
    renewables: &[RenewableRow],
    path: &Path,
) -> Result<(), ChartError> {
    let breakdown: Vec<&RenewableRow> = renewables.iter().filter(|r| r.state == row.state).collect();

    let height = if breakdown.is_empty() { 480 } else { 820 };
    let mut canvas = Canvas::new(height);
    canvas.title(&format!(
        "Energy Consumption by Source ({}): {}",
        row.year, row.state
    ));

    let sources: Vec<(String, Option<f64>, Rgb<u8>)> = STACK_ORDER
        .iter()
        .map(|s| (s.label().to_string(), Some(row.value(*s)), fill(*s)))
        .collect();
    let bottom = if breakdown.is_empty() { 420 } else { 380 };
    bar_panel(
        &mut canvas,
        Panel { top: 56, bottom },
        &sources,
        "All Consumption (Trillion Btu)",
    );

    if !breakdown.is_empty() {
        let green = fill(EnergySource::Renewable);
        let bars: Vec<(String, Option<f64>, Rgb<u8>)> = breakdown
            .iter()
            .map(|r| (r.category.clone(), r.value, green))
            .collect();
        bar_panel(
            &mut canvas,
            Panel { top: 430, bottom: 780 },
            &bars,
            "Renewable Consumption (Trillion Btu)",
        );
    }
    canvas.save(path)?;
    debug!(
        state = %row.state,
        year = row.year,
        categories = breakdown.len(),
        path = %path.display(),
        "single-year chart"
    );
    Ok(())
}

/// Render both chart kinds for one state into `dir`.
///
/// `rows` feed the composition chart. The single-year chart is drawn from
/// `snapshot` and skipped when there is none.
pub fn write_state_charts(
    state: State,
    rows: &[WideRow],
    snapshot: Option<&WideRow>,
    renewables: &[RenewableRow],
    dir: &Path,
) -> Result<Vec<PathBuf>, ChartError> {
    let mut written = Vec::new();

    let path = chart_path(dir, ChartKind::Composition, state);
    render_composition(state, rows, &path)?;
    written.push(path);

    if let Some(row) = snapshot {
        let path = chart_path(dir, ChartKind::SingleYear(row.year), state);
        render_single_year(row, renewables, &path)?;
        written.push(path);
    }
    info!(%state, charts = written.len(), "charts written");
    Ok(written)
}
