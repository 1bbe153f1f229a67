//! Tunable thresholds for hazard filtering, buffering and scoring.

use crate::models::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read severity table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse severity table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("severity table invalid: {0}")]
    Invalid(String),
}

/// Per-severity tuning row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityProfile {
    /// Radius of the avoidance buffer around the hazard center.
    pub buffer_radius_mi: f64,
    /// A route closer than this counts the hazard as nearby.
    pub proximity_mi: f64,
    /// Score penalty for a nearby hazard sitting directly on the route.
    pub penalty_weight: f64,
}

/// Severity → profile mapping, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityTable {
    pub critical: SeverityProfile,
    pub high: SeverityProfile,
    pub medium: SeverityProfile,
    pub low: SeverityProfile,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            critical: SeverityProfile {
                buffer_radius_mi: 5.0,
                proximity_mi: 10.0,
                penalty_weight: 40.0,
            },
            high: SeverityProfile {
                buffer_radius_mi: 3.0,
                proximity_mi: 6.0,
                penalty_weight: 25.0,
            },
            medium: SeverityProfile {
                buffer_radius_mi: 1.5,
                proximity_mi: 3.0,
                penalty_weight: 12.0,
            },
            low: SeverityProfile {
                buffer_radius_mi: 0.5,
                proximity_mi: 1.0,
                penalty_weight: 5.0,
            },
        }
    }
}

impl SeverityTable {
    pub fn profile(&self, severity: Severity) -> &SeverityProfile {
        match severity {
            Severity::Critical => &self.critical,
            Severity::High => &self.high,
            Severity::Medium => &self.medium,
            Severity::Low => &self.low,
        }
    }

    pub fn buffer_radius_mi(&self, severity: Severity) -> f64 {
        self.profile(severity).buffer_radius_mi
    }

    /// Load a table from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path)?;
        let table: SeverityTable = serde_json::from_str(&raw)?;
        table.validate()?;
        Ok(table)
    }

    /// Every column must be positive and strictly ordered critical > high > medium > low.
    pub fn validate(&self) -> Result<(), RulesError> {
        let rows: Vec<(Severity, &SeverityProfile)> = Severity::ALL
            .iter()
            .map(|severity| (*severity, self.profile(*severity)))
            .collect();

        for (severity, profile) in &rows {
            let values = [
                profile.buffer_radius_mi,
                profile.proximity_mi,
                profile.penalty_weight,
            ];
            if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(RulesError::Invalid(format!(
                    "{} values must be positive",
                    severity.as_str()
                )));
            }
            if profile.proximity_mi < profile.buffer_radius_mi {
                return Err(RulesError::Invalid(format!(
                    "{} proximity must not be smaller than its buffer radius",
                    severity.as_str()
                )));
            }
        }

        for pair in rows.windows(2) {
            let (upper, a) = pair[0];
            let (lower, b) = pair[1];
            if a.buffer_radius_mi <= b.buffer_radius_mi
                || a.proximity_mi <= b.proximity_mi
                || a.penalty_weight <= b.penalty_weight
            {
                return Err(RulesError::Invalid(format!(
                    "{} must exceed {} in every column",
                    upper.as_str(),
                    lower.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for hazard selection and exposure scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardRules {
    /// Reports older than this are considered inactive.
    pub max_age_hours: i64,
    /// Vertices per avoidance polygon.
    pub polygon_segments: usize,
    /// Upper bound on polygons sent to the routing provider.
    pub max_avoid_regions: usize,
    pub severities: SeverityTable,
}

impl Default for HazardRules {
    fn default() -> Self {
        Self {
            max_age_hours: 48,
            polygon_segments: 16,
            max_avoid_regions: 40,
            severities: SeverityTable::default(),
        }
    }
}
