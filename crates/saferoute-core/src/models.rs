//! Core data models for the route safety engine.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Invalid coordinate supplied by a caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),
}

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a coordinate, rejecting anything outside the WGS84 range.
    pub fn checked(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        let coord = Self { lat, lon };
        coord.validate()?;
        Ok(coord)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::Latitude(self.lat));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(CoordinateError::Longitude(self.lon));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

/// Kind of reported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardType {
    Wildfire,
    Earthquake,
    Flood,
    Hurricane,
    Tornado,
    Drought,
    #[serde(other)]
    Other,
}

impl HazardType {
    /// Localized point hazards that can threaten a driving route.
    pub fn is_routable(self) -> bool {
        matches!(
            self,
            Self::Wildfire | Self::Earthquake | Self::Flood | Self::Hurricane | Self::Tornado
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[serde(alias = "moderate")]
    Medium,
    High,
    #[serde(alias = "extreme", alias = "severe")]
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A normalized hazard report supplied by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: String,
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    pub severity: Severity,
    pub latitude: f64,
    pub longitude: f64,
    /// Raw timestamp as reported; parsed lazily so bad values can fail open.
    pub timestamp: String,
    #[serde(default)]
    pub source: String,
}

impl Hazard {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Parse the report time. Accepts RFC 3339, naive ISO-8601 (assumed UTC)
    /// and unix epoch seconds.
    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Circular zone around a hazard that a route should not cross.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceRegion {
    pub hazard_id: String,
    pub severity: Severity,
    pub center: Coordinate,
    pub radius_mi: f64,
}

impl AvoidanceRegion {
    /// Closed polygon ring approximating the circle, as `[lon, lat]` pairs.
    pub fn polygon(&self, segments: usize) -> Vec<[f64; 2]> {
        crate::spatial::circle_polygon(self.center, self.radius_mi, segments)
    }
}

/// One turn-by-turn instruction along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_mi: f64,
    pub duration_seconds: f64,
    pub maneuver_type: String,
}

/// Exposure of a route to active hazards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetySummary {
    pub score: f64,
    pub nearby_count: usize,
    pub min_distance_mi: Option<f64>,
    /// False for the sentinel attached to routes that were never scored.
    pub analyzed: bool,
}

impl SafetySummary {
    /// Sentinel meaning "no exposure analysis performed".
    pub fn not_analyzed() -> Self {
        Self {
            score: 0.0,
            nearby_count: 0,
            min_distance_mi: None,
            analyzed: false,
        }
    }

    pub fn perfectly_safe() -> Self {
        Self {
            score: 100.0,
            nearby_count: 0,
            min_distance_mi: None,
            analyzed: true,
        }
    }
}

/// A candidate driving route as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub route_id: String,
    pub distance_mi: f64,
    pub duration_seconds: f64,
    /// Ordered `(lon, lat)` pairs.
    pub geometry: Vec<[f64; 2]>,
    pub waypoints: Vec<RouteStep>,
    pub provider: String,
    pub is_baseline: bool,
    pub is_fastest: bool,
    pub is_shortest: bool,
    pub safety: SafetySummary,
}

impl RoutePlan {
    /// Consume the plan and return it with an exposure summary attached.
    pub fn with_safety(self, safety: SafetySummary) -> Self {
        Self { safety, ..self }
    }
}

/// Optimization target for the baseline comparator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    #[default]
    Fastest,
    Shortest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown route mode '{0}' (expected fastest or shortest)")]
pub struct RouteModeError(String);

impl FromStr for RouteMode {
    type Err = RouteModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fastest" | "time" => Ok(Self::Fastest),
            "shortest" | "distance" => Ok(Self::Shortest),
            other => Err(RouteModeError(other.to_string())),
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fastest => f.write_str("fastest"),
            Self::Shortest => f.write_str("shortest"),
        }
    }
}
