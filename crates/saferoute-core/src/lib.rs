//! SafeRoute core - hazard selection, avoidance geometry and exposure scoring.
//!
//! Everything in this crate is pure and deterministic; provider I/O lives in
//! `saferoute-providers` and orchestration in `saferoute-engine`.

pub mod buffers;
pub mod filter;
pub mod models;
pub mod polyline;
pub mod rules;
pub mod scoring;
pub mod spatial;

pub use buffers::{build_avoidance_plan, AvoidancePlan};
pub use filter::active_hazards;
pub use models::{
    AvoidanceRegion, Coordinate, CoordinateError, Hazard, HazardType, RouteMode, RoutePlan,
    RouteStep, SafetySummary, Severity,
};
pub use polyline::PolylineError;
pub use rules::{HazardRules, RulesError, SeverityProfile, SeverityTable};
pub use scoring::score_route;
pub use spatial::{haversine_distance, meters_to_miles, METERS_PER_MILE};
