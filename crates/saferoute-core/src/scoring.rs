//! Route exposure scoring against active hazards.
//!
//! Each hazard within its severity's proximity threshold costs
//! `penalty_weight × (1 − distance / proximity)` points from a starting
//! score of 100. The result is clamped to [0, 100].

use crate::models::{Hazard, SafetySummary};
use crate::rules::SeverityTable;
use crate::spatial::distance_to_polyline_mi;

const MAX_SCORE: f64 = 100.0;

/// Score a `[lon, lat]` route geometry against `active_hazards`.
pub fn score_route(
    geometry: &[[f64; 2]],
    active_hazards: &[Hazard],
    table: &SeverityTable,
) -> SafetySummary {
    if active_hazards.is_empty() {
        return SafetySummary::perfectly_safe();
    }

    let mut penalty = 0.0;
    let mut nearby_count = 0usize;
    let mut min_distance_mi: Option<f64> = None;

    for hazard in active_hazards {
        let Some(distance) = distance_to_polyline_mi(hazard.center(), geometry) else {
            continue;
        };
        min_distance_mi = Some(min_distance_mi.map_or(distance, |d| d.min(distance)));

        let profile = table.profile(hazard.severity);
        if distance < profile.proximity_mi {
            nearby_count += 1;
            penalty += profile.penalty_weight * (1.0 - distance / profile.proximity_mi);
        }
    }

    SafetySummary {
        score: (MAX_SCORE - penalty).clamp(0.0, MAX_SCORE),
        nearby_count,
        min_distance_mi,
        analyzed: true,
    }
}
