//! Client for the hazard-agnostic baseline provider.
//!
//! Speaks the GraphHopper routing API. Only the provider's best candidate is
//! requested; its geometry arrives as an encoded polyline.

use crate::convert::{
    baseline_maneuver, lat_lon_param, lon_lat_pair, meters_to_miles, millis_to_seconds,
    truncate_body,
};
use crate::error::ProviderError;
use reqwest::Client;
use saferoute_core::polyline;
use saferoute_core::{Coordinate, RouteMode, RoutePlan, RouteStep, SafetySummary};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "graphhopper";
pub const DEFAULT_BASE_URL: &str = "https://graphhopper.com/api/1";

#[derive(Debug, Clone)]
pub struct BaselineSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for BaselineSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

/// HTTP client for the baseline routing API.
#[derive(Debug, Clone)]
pub struct BaselineClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    paths: Option<Vec<RoutePath>>,
}

#[derive(Debug, Deserialize)]
struct RoutePath {
    #[serde(default)]
    distance: f64,
    /// Milliseconds.
    #[serde(default)]
    time: f64,
    /// Encoded polyline string, or a GeoJSON LineString when encoding is off.
    #[serde(default)]
    points: Value,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
struct Instruction {
    #[serde(default)]
    text: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    time: f64,
    sign: Option<i64>,
}

impl BaselineClient {
    pub fn new(client: Client, settings: BaselineSettings) -> Self {
        let api_key = settings
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: settings.timeout,
        }
    }

    /// Without a credential the comparator is disabled.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Request the single best hazard-agnostic route for `mode`.
    pub async fn calculate_baseline_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: RouteMode,
    ) -> Result<RoutePlan, ProviderError> {
        origin.validate()?;
        destination.validate()?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::Disabled(PROVIDER_NAME))?;

        let mut query: Vec<(&str, String)> = vec![
            ("point", lat_lon_param(origin)),
            ("point", lat_lon_param(destination)),
            ("profile", "car".to_string()),
            ("points_encoded", "true".to_string()),
            ("instructions", "true".to_string()),
            ("locale", "en".to_string()),
            ("key", api_key.to_string()),
        ];
        match mode {
            RouteMode::Fastest => query.push(("weighting", "fastest".to_string())),
            RouteMode::Shortest => {
                query.push(("weighting", "shortest".to_string()));
                query.push(("ch.disable", "true".to_string()));
            }
        }

        let url = format!("{}/route", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                let err = ProviderError::from_reqwest(err, self.timeout);
                tracing::warn!("Baseline request failed: {}", err);
                err
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            let err = ProviderError::from_reqwest(err, self.timeout);
            tracing::warn!("Baseline response unreadable: {}", err);
            err
        })?;

        if !status.is_success() {
            let body = truncate_body(&body);
            tracing::warn!("Baseline provider HTTP {}: {}", status, body);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: RouteResponse = serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(
                "Baseline response parse failed: {} (body: {})",
                err,
                truncate_body(&body)
            );
            ProviderError::Decode(err.to_string())
        })?;

        parse_baseline(payload, mode)
    }
}

fn parse_baseline(payload: RouteResponse, mode: RouteMode) -> Result<RoutePlan, ProviderError> {
    let path = payload
        .paths
        .ok_or_else(|| ProviderError::Decode("response missing paths".to_string()))?
        .into_iter()
        .next()
        .ok_or(ProviderError::NoRoutes)?;

    let waypoints = path
        .instructions
        .into_iter()
        .map(|instruction| RouteStep {
            instruction: instruction.text,
            distance_mi: meters_to_miles(instruction.distance),
            duration_seconds: millis_to_seconds(instruction.time),
            maneuver_type: baseline_maneuver(instruction.sign).to_string(),
        })
        .collect();

    Ok(RoutePlan {
        route_id: format!("{}-baseline", PROVIDER_NAME),
        distance_mi: meters_to_miles(path.distance),
        duration_seconds: millis_to_seconds(path.time),
        geometry: decode_points(&path.points),
        waypoints,
        provider: PROVIDER_NAME.to_string(),
        is_baseline: true,
        is_fastest: mode == RouteMode::Fastest,
        is_shortest: mode == RouteMode::Shortest,
        safety: SafetySummary::not_analyzed(),
    })
}

/// Geometry as `[lon, lat]`; anything undecodable becomes an empty line.
fn decode_points(points: &Value) -> Vec<[f64; 2]> {
    match points {
        Value::String(encoded) => polyline::decode_or_empty(encoded),
        Value::Object(line) => line
            .get("coordinates")
            .and_then(Value::as_array)
            .map(|coords| {
                coords
                    .iter()
                    .filter_map(|raw| {
                        let pair: Vec<f64> =
                            raw.as_array()?.iter().filter_map(Value::as_f64).collect();
                        lon_lat_pair(&pair)
                    })
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
