//! Client for the avoidance-capable directions provider.
//!
//! Speaks the OpenRouteService directions API: a single POST per request
//! carrying origin, destination, exclusion polygons and the number of
//! alternatives, answered with a GeoJSON feature collection.

use crate::convert::{
    avoidance_maneuver, lon_lat_pair, meters_to_miles, to_lon_lat, truncate_body,
};
use crate::error::ProviderError;
use reqwest::Client;
use saferoute_core::{Coordinate, RoutePlan, RouteStep, SafetySummary};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PROVIDER_NAME: &str = "openrouteservice";
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

const DIRECTIONS_PATH: &str = "/v2/directions/driving-car/geojson";
const MAX_ALTERNATIVES: usize = 3;
const ALTERNATIVE_WEIGHT_FACTOR: f64 = 1.6;
const ALTERNATIVE_SHARE_FACTOR: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct AvoidanceSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for AvoidanceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the avoidance-capable directions API.
#[derive(Debug, Clone)]
pub struct AvoidanceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: [[f64; 2]; 2],
    instructions: bool,
    units: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    alternative_routes: Option<AlternativeRoutes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<DirectionsOptions>,
}

#[derive(Debug, Serialize)]
struct AlternativeRoutes {
    target_count: usize,
    weight_factor: f64,
    share_factor: f64,
}

#[derive(Debug, Serialize)]
struct DirectionsOptions {
    avoid_polygons: MultiPolygon,
}

#[derive(Debug, Serialize)]
struct MultiPolygon {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<Vec<Vec<[f64; 2]>>>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    features: Option<Vec<Feature>>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<FeatureGeometry>,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureGeometry {
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    summary: Summary,
    #[serde(default)]
    segments: Vec<Segment>,
}

// The provider omits zero-valued summary fields.
#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    instruction: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(rename = "type")]
    step_type: Option<i64>,
}

impl AvoidanceClient {
    /// Create a client sharing `client`'s connection pool.
    /// An empty or missing key leaves the client disabled.
    pub fn new(client: Client, settings: AvoidanceSettings) -> Self {
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

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Request up to `alternatives` driving routes that stay out of every
    /// closed `[lon, lat]` ring in `avoid`.
    ///
    /// Invalid coordinates fail before any network call. Every upstream
    /// failure is logged and returned as an error; nothing is retried.
    pub async fn calculate_routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        avoid: &[Vec<[f64; 2]>],
        alternatives: usize,
    ) -> Result<Vec<RoutePlan>, ProviderError> {
        origin.validate()?;
        destination.validate()?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::Disabled(PROVIDER_NAME))?;

        let request = self.build_request(origin, destination, avoid, alternatives);
        let url = format!("{}{}", self.base_url, DIRECTIONS_PATH);

        let response = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .header("Accept", "application/geo+json, application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                let err = ProviderError::from_reqwest(err, self.timeout);
                tracing::warn!("Directions request failed: {}", err);
                err
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            let err = ProviderError::from_reqwest(err, self.timeout);
            tracing::warn!("Directions response unreadable: {}", err);
            err
        })?;

        if !status.is_success() {
            let body = truncate_body(&body);
            tracing::warn!("Directions provider HTTP {}: {}", status, body);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: DirectionsResponse = serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(
                "Directions response parse failed: {} (body: {})",
                err,
                truncate_body(&body)
            );
            ProviderError::Decode(err.to_string())
        })?;

        let routes = parse_routes(payload)?;
        tracing::debug!(
            "Directions provider returned {} route(s) avoiding {} region(s)",
            routes.len(),
            avoid.len()
        );
        Ok(routes)
    }

    fn build_request(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        avoid: &[Vec<[f64; 2]>],
        alternatives: usize,
    ) -> DirectionsRequest {
        let target_count = alternatives.clamp(1, MAX_ALTERNATIVES);
        let alternative_routes = (target_count > 1).then_some(AlternativeRoutes {
            target_count,
            weight_factor: ALTERNATIVE_WEIGHT_FACTOR,
            share_factor: ALTERNATIVE_SHARE_FACTOR,
        });

        let options = (!avoid.is_empty()).then(|| DirectionsOptions {
            avoid_polygons: MultiPolygon {
                kind: "MultiPolygon",
                coordinates: avoid.iter().map(|ring| vec![ring.clone()]).collect(),
            },
        });

        DirectionsRequest {
            coordinates: [to_lon_lat(origin), to_lon_lat(destination)],
            instructions: true,
            units: "m",
            alternative_routes,
            options,
        }
    }
}

fn parse_routes(payload: DirectionsResponse) -> Result<Vec<RoutePlan>, ProviderError> {
    let features = payload
        .features
        .ok_or_else(|| ProviderError::Decode("response missing features".to_string()))?;
    if features.is_empty() {
        tracing::warn!("Directions provider returned an empty feature collection");
        return Err(ProviderError::NoRoutes);
    }

    let fastest = index_of_min(features.iter().map(|f| f.properties.summary.duration));
    let shortest = index_of_min(features.iter().map(|f| f.properties.summary.distance));

    let routes = features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let geometry = feature
                .geometry
                .map(|geometry| {
                    geometry
                        .coordinates
                        .iter()
                        .filter_map(|raw| lon_lat_pair(raw))
                        .collect()
                })
                .unwrap_or_default();

            let waypoints = feature
                .properties
                .segments
                .into_iter()
                .flat_map(|segment| segment.steps)
                .map(|step| RouteStep {
                    instruction: step.instruction,
                    distance_mi: meters_to_miles(step.distance),
                    duration_seconds: step.duration,
                    maneuver_type: avoidance_maneuver(step.step_type).to_string(),
                })
                .collect();

            RoutePlan {
                route_id: format!("{}-{}", PROVIDER_NAME, idx),
                distance_mi: meters_to_miles(feature.properties.summary.distance),
                duration_seconds: feature.properties.summary.duration,
                geometry,
                waypoints,
                provider: PROVIDER_NAME.to_string(),
                is_baseline: false,
                is_fastest: Some(idx) == fastest,
                is_shortest: Some(idx) == shortest,
                safety: SafetySummary::not_analyzed(),
            }
        })
        .collect();

    Ok(routes)
}

fn index_of_min(values: impl Iterator<Item = f64>) -> Option<usize> {
    values
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx)
}
