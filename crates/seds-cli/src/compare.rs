//! The comparison query surface: result table, chart paths, request echo.

use std::path::PathBuf;

use seds_chart::{ChartKind, chart_path};
use seds_core::{State, Year};
use seds_store::{ComparisonRequest, ComparisonResult, LookupService};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub all_years: bool,
    pub show_request: bool,
    pub graphs_dir: PathBuf,
    pub snapshot_year: Year,
}

/// Everything one comparison request renders.
#[derive(Debug, Clone)]
pub struct ComparisonView {
    pub result: ComparisonResult,
    /// Set when the lookup failed; the result is then empty.
    pub diagnostic: Option<String>,
    pub charts: Vec<PathBuf>,
    pub request_echo: Option<String>,
}

pub fn build_view(
    service: &LookupService,
    request: &ComparisonRequest,
    options: &ViewOptions,
) -> ComparisonView {
    let (result, diagnostic) = match service.lookup(request) {
        Ok(result) => (result, None),
        Err(e) => {
            warn!(error = %e, "lookup failed");
            (ComparisonResult::default(), Some(e.to_string()))
        }
    };

    let states: Vec<State> = request
        .selected()
        .into_iter()
        .filter_map(State::resolve)
        .collect();
    let mut kinds = vec![ChartKind::SingleYear(options.snapshot_year)];
    if options.all_years {
        kinds.push(ChartKind::Composition);
    }
    let charts = kinds
        .iter()
        .flat_map(|kind| {
            states
                .iter()
                .map(|state| chart_path(&options.graphs_dir, *kind, *state))
        })
        .collect();

    let request_echo = if options.show_request {
        serde_json::to_string(request).ok()
    } else {
        None
    };

    ComparisonView {
        result,
        diagnostic,
        charts,
        request_echo,
    }
}
