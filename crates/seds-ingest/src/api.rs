//! EIA series API: request URLs and response parsing.
//!
//! A series id is `SEDS.<code>.<ST>.A`, e.g. `SEDS.CLTCB.IL.A` for annual
//! Illinois coal consumption. The response carries
//! `{"series": [{"data": [["2017", 123.4], ...]}]}`.

use serde::Deserialize;
use serde_json::Value;

use seds_core::{EnergySource, State, Year};

use crate::IngestError;
use crate::normalize::{SeriesPoint, parse_value};

pub fn series_id(state: State, source: EnergySource) -> String {
    format!("SEDS.{}.{}.A", source.series_code(), state.abbrev())
}

/// Full request URL. Contains the API key, so never log it.
pub fn series_url(base: &str, api_key: &str, state: State, source: EnergySource) -> String {
    format!(
        "{base}?api_key={api_key}&series_id={}",
        series_id(state, source)
    )
}

/// Mask the `api_key` query value so a URL can be logged or reported.
pub fn redact(url: &str) -> String {
    let Some(start) = url.find("api_key=").map(|i| i + "api_key=".len()) else {
        return url.to_string();
    };
    let end = url[start..].find('&').map_or(url.len(), |i| start + i);
    format!("{}***{}", &url[..start], &url[end..])
}

#[derive(Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    series: Vec<Series>,
}

#[derive(Deserialize)]
struct Series {
    #[serde(default)]
    data: Vec<(Value, Value)>,
}

/// Parse a series response into points.
///
/// Years arrive as strings or numbers; values may be numbers, numeric strings,
/// or null. Points whose year isn't an integer are skipped.
pub fn parse_series(series_id: &str, body: &str) -> Result<Vec<SeriesPoint>, IngestError> {
    let response: SeriesResponse = serde_json::from_str(body)?;
    let series = response
        .series
        .into_iter()
        .next()
        .ok_or_else(|| IngestError::malformed(series_id, "series"))?;

    Ok(series
        .data
        .into_iter()
        .filter_map(|(year, value)| {
            Some(SeriesPoint {
                year: year_of(&year)?,
                value: value_of(&value),
            })
        })
        .collect())
}

fn year_of(v: &Value) -> Option<Year> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|y| Year::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_of(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_value(s),
        _ => None,
    }
}
