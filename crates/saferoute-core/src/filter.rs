//! Selection of hazards that can influence a trip.

use crate::models::Hazard;
use crate::rules::HazardRules;
use chrono::{DateTime, Duration, Utc};

/// Return the hazards that are active at `now`.
///
/// A hazard is active when its type is a localized routable threat, its
/// coordinates are valid, and it is not older than the staleness window.
/// Reports with unparseable timestamps are kept.
pub fn active_hazards(hazards: &[Hazard], now: DateTime<Utc>, rules: &HazardRules) -> Vec<Hazard> {
    // Windows too large to represent keep every dated report.
    let max_age = Duration::try_hours(rules.max_age_hours.max(0)).unwrap_or(Duration::MAX);
    hazards
        .iter()
        .filter(|hazard| is_active(hazard, now, max_age))
        .cloned()
        .collect()
}

fn is_active(hazard: &Hazard, now: DateTime<Utc>, max_age: Duration) -> bool {
    if !hazard.hazard_type.is_routable() {
        return false;
    }
    if let Err(err) = hazard.center().validate() {
        tracing::debug!("Dropping hazard {} with bad position: {}", hazard.id, err);
        return false;
    }
    match hazard.reported_at() {
        Some(reported_at) => now.signed_duration_since(reported_at) <= max_age,
        None => {
            tracing::debug!(
                "Keeping hazard {} with unparseable timestamp '{}'",
                hazard.id,
                hazard.timestamp
            );
            true
        }
    }
}
