//! Avoidance buffers and the origin containment rule.

use crate::models::{AvoidanceRegion, Coordinate, Hazard};
use crate::rules::HazardRules;
use crate::spatial::distance_mi;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Geometry derived for one routing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidancePlan {
    /// Regions the routing provider is asked to avoid.
    pub avoidance_regions: Vec<AvoidanceRegion>,
    /// Every active hazard, including those not avoided.
    pub active_hazards: Vec<Hazard>,
    /// Hazards skipped because the trip starts inside their buffer.
    pub contained_hazard_ids: Vec<String>,
}

impl AvoidancePlan {
    pub fn is_origin_contained(&self) -> bool {
        !self.contained_hazard_ids.is_empty()
    }

    /// Avoidance polygons as `[lon, lat]` rings.
    pub fn polygons(&self, segments: usize) -> Vec<Vec<[f64; 2]>> {
        self.avoidance_regions
            .iter()
            .map(|region| region.polygon(segments))
            .collect()
    }
}

/// Build avoidance regions for `active` hazards around a trip starting at `origin`.
///
/// A hazard whose buffer already contains the origin is excluded so the
/// traveler can route out of it; it stays in `active_hazards` for scoring.
pub fn build_avoidance_plan(
    origin: Coordinate,
    active: Vec<Hazard>,
    rules: &HazardRules,
) -> AvoidancePlan {
    let mut candidates: Vec<(AvoidanceRegion, f64)> = Vec::new();
    let mut contained_hazard_ids = Vec::new();

    for hazard in &active {
        let radius_mi = rules.severities.buffer_radius_mi(hazard.severity);
        let center = hazard.center();
        let from_origin_mi = distance_mi(origin, center);

        if from_origin_mi <= radius_mi {
            tracing::debug!(
                "Origin {} is {:.2} mi inside {} buffer of hazard {}, not avoiding it",
                origin,
                from_origin_mi,
                hazard.severity.as_str(),
                hazard.id
            );
            contained_hazard_ids.push(hazard.id.clone());
            continue;
        }

        candidates.push((
            AvoidanceRegion {
                hazard_id: hazard.id.clone(),
                severity: hazard.severity,
                center,
                radius_mi,
            },
            from_origin_mi,
        ));
    }

    let avoidance_regions = cap_regions(candidates, rules.max_avoid_regions);

    AvoidancePlan {
        avoidance_regions,
        active_hazards: active,
        contained_hazard_ids,
    }
}

fn cap_regions(mut candidates: Vec<(AvoidanceRegion, f64)>, max: usize) -> Vec<AvoidanceRegion> {
    if candidates.len() > max {
        candidates.sort_by(|(a, da), (b, db)| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| da.partial_cmp(db).unwrap_or(Ordering::Equal))
        });
        tracing::warn!(
            "Avoidance regions capped at {} (dropped {})",
            max,
            candidates.len() - max
        );
        candidates.truncate(max);
    }
    candidates.into_iter().map(|(region, _)| region).collect()
}
