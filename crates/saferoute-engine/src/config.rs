//! Engine configuration from environment.

use saferoute_core::{HazardRules, SeverityTable};
use saferoute_providers::{avoidance, baseline, AvoidanceSettings, BaselineSettings};
use std::env;
use std::time::Duration;

/// A century; beyond this the staleness window is effectively off.
const MAX_HAZARD_AGE_HOURS: i64 = 24 * 365 * 100;
const MAX_CALL_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub ors_api_key: Option<String>,
    pub ors_url: String,
    pub baseline_api_key: Option<String>,
    pub baseline_url: String,
    pub routing_timeout_s: u64,
    pub baseline_timeout_s: u64,
    pub hazard_max_age_hours: i64,
    pub polygon_segments: usize,
    pub max_avoid_regions: usize,
    /// Optional JSON file overriding the severity table.
    pub severity_table_path: Option<String>,
    /// Minimum spacing between calls to the same provider (0 disables).
    pub min_call_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ors_api_key: None,
            ors_url: avoidance::DEFAULT_BASE_URL.to_string(),
            baseline_api_key: None,
            baseline_url: baseline::DEFAULT_BASE_URL.to_string(),
            routing_timeout_s: 30,
            baseline_timeout_s: 15,
            hazard_max_age_hours: 48,
            polygon_segments: 16,
            max_avoid_regions: 40,
            severity_table_path: None,
            min_call_interval_ms: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ors_api_key: non_empty_var("SAFEROUTE_ORS_API_KEY"),
            ors_url: env::var("SAFEROUTE_ORS_URL").unwrap_or(defaults.ors_url),
            baseline_api_key: non_empty_var("SAFEROUTE_BASELINE_API_KEY"),
            baseline_url: env::var("SAFEROUTE_BASELINE_URL").unwrap_or(defaults.baseline_url),
            routing_timeout_s: parsed_var("SAFEROUTE_ROUTING_TIMEOUT_S")
                .unwrap_or(defaults.routing_timeout_s),
            baseline_timeout_s: parsed_var("SAFEROUTE_BASELINE_TIMEOUT_S")
                .unwrap_or(defaults.baseline_timeout_s),
            hazard_max_age_hours: parsed_var("SAFEROUTE_HAZARD_MAX_AGE_HOURS")
                .unwrap_or(defaults.hazard_max_age_hours),
            polygon_segments: parsed_var("SAFEROUTE_POLYGON_SEGMENTS")
                .unwrap_or(defaults.polygon_segments),
            max_avoid_regions: parsed_var("SAFEROUTE_MAX_AVOID_REGIONS")
                .unwrap_or(defaults.max_avoid_regions),
            severity_table_path: non_empty_var("SAFEROUTE_SEVERITY_TABLE"),
            min_call_interval_ms: parsed_var("SAFEROUTE_MIN_CALL_INTERVAL_MS")
                .unwrap_or(defaults.min_call_interval_ms),
        }
    }

    /// Build hazard rules. A severity table that fails to load is logged
    /// and replaced by the defaults.
    pub fn hazard_rules(&self) -> HazardRules {
        let severities = match self.severity_table_path.as_deref() {
            Some(path) => SeverityTable::from_json_file(path).unwrap_or_else(|err| {
                tracing::warn!("Ignoring severity table {}: {}", path, err);
                SeverityTable::default()
            }),
            None => SeverityTable::default(),
        };
        HazardRules {
            max_age_hours: self.hazard_max_age_hours.clamp(1, MAX_HAZARD_AGE_HOURS),
            polygon_segments: self.polygon_segments.clamp(4, 64),
            max_avoid_regions: self.max_avoid_regions.max(1),
            severities,
        }
    }

    pub fn avoidance_settings(&self) -> AvoidanceSettings {
        AvoidanceSettings {
            base_url: self.ors_url.clone(),
            api_key: self.ors_api_key.clone(),
            timeout: Duration::from_secs(self.routing_timeout_s.max(1)),
        }
    }

    pub fn baseline_settings(&self) -> BaselineSettings {
        BaselineSettings {
            base_url: self.baseline_url.clone(),
            api_key: self.baseline_api_key.clone(),
            timeout: Duration::from_secs(self.baseline_timeout_s.max(1)),
        }
    }

    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms.min(MAX_CALL_INTERVAL_MS))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
