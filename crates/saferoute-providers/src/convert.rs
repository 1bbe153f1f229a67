//! Unit and coordinate-order conversion at the provider boundary.
//!
//! Providers speak `[lon, lat]` and meters; callers speak `(lat, lon)` and
//! miles. All swapping and scaling goes through here.

use saferoute_core::Coordinate;

pub use saferoute_core::spatial::meters_to_miles;

const MAX_LOGGED_BODY_CHARS: usize = 300;

/// Internal coordinate to the provider's `[lon, lat]` order.
pub fn to_lon_lat(coord: Coordinate) -> [f64; 2] {
    [coord.lon, coord.lat]
}

/// Provider `[lon, lat]` (optionally with elevation) to an internal pair.
///
/// Returns `None` for short or non-finite entries.
pub fn lon_lat_pair(raw: &[f64]) -> Option<[f64; 2]> {
    match raw {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some([*lon, *lat]),
        _ => None,
    }
}

pub fn millis_to_seconds(millis: f64) -> f64 {
    millis / 1000.0
}

/// Query-string form `lat,lon` used by the baseline provider.
pub fn lat_lon_param(coord: Coordinate) -> String {
    format!("{:.6},{:.6}", coord.lat, coord.lon)
}

/// Step type codes from the avoidance provider's directions API.
pub fn avoidance_maneuver(code: Option<i64>) -> &'static str {
    match code {
        Some(0) => "turn-left",
        Some(1) => "turn-right",
        Some(2) => "sharp-left",
        Some(3) => "sharp-right",
        Some(4) => "slight-left",
        Some(5) => "slight-right",
        Some(6) => "straight",
        Some(7) => "enter-roundabout",
        Some(8) => "exit-roundabout",
        Some(9) => "u-turn",
        Some(10) => "arrive",
        Some(11) => "depart",
        Some(12) => "keep-left",
        Some(13) => "keep-right",
        _ => "unknown",
    }
}

/// Instruction sign codes from the baseline provider.
pub fn baseline_maneuver(sign: Option<i64>) -> &'static str {
    match sign {
        Some(-98) | Some(-8) | Some(8) => "u-turn",
        Some(-7) => "keep-left",
        Some(-3) => "sharp-left",
        Some(-2) => "turn-left",
        Some(-1) => "slight-left",
        Some(0) => "straight",
        Some(1) => "slight-right",
        Some(2) => "turn-right",
        Some(3) => "sharp-right",
        Some(4) => "arrive",
        Some(5) => "via",
        Some(6) => "roundabout",
        Some(7) => "keep-right",
        _ => "unknown",
    }
}

/// Clip a response body for log lines.
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY_CHARS {
        return body.to_string();
    }
    let clipped: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
    format!("{}...", clipped)
}
