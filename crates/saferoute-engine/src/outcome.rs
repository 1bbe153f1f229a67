//! Explicit results for engine operations.
//!
//! Provider failures never surface as errors to callers; they become a
//! `Failed` variant carrying the reason, so an empty answer and a broken
//! upstream stay distinguishable.

use saferoute_core::RoutePlan;
use saferoute_providers::ProviderError;
use serde::ser::{Serialize, Serializer};

#[derive(Debug)]
pub enum RouteOutcome {
    Routes(Vec<RoutePlan>),
    Failed(ProviderError),
}

impl RouteOutcome {
    pub fn routes(&self) -> &[RoutePlan] {
        match self {
            Self::Routes(routes) => routes,
            Self::Failed(_) => &[],
        }
    }

    /// Routes, or an empty list for any failure.
    pub fn into_routes(self) -> Vec<RoutePlan> {
        match self {
            Self::Routes(routes) => routes,
            Self::Failed(_) => Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<&ProviderError> {
        match self {
            Self::Routes(_) => None,
            Self::Failed(err) => Some(err),
        }
    }
}

#[derive(Debug)]
pub enum BaselineOutcome {
    Route(RoutePlan),
    /// No baseline credential is configured.
    Disabled,
    Failed(ProviderError),
}

impl BaselineOutcome {
    pub fn route(&self) -> Option<&RoutePlan> {
        match self {
            Self::Route(route) => Some(route),
            _ => None,
        }
    }

    pub fn into_route(self) -> Option<RoutePlan> {
        match self {
            Self::Route(route) => Some(route),
            _ => None,
        }
    }
}

/// What the safest avoidance route costs relative to the baseline.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Tradeoff {
    pub route_id: String,
    pub baseline_route_id: String,
    pub safety_score: f64,
    pub extra_distance_mi: f64,
    pub extra_duration_seconds: f64,
}

impl Tradeoff {
    /// Pick the highest-scoring route (ties go to the quicker one) and
    /// measure it against `baseline`.
    pub fn safest(routes: &[RoutePlan], baseline: &RoutePlan) -> Option<Self> {
        let safest = routes.iter().max_by(|a, b| {
            a.safety
                .score
                .total_cmp(&b.safety.score)
                .then_with(|| b.duration_seconds.total_cmp(&a.duration_seconds))
        })?;

        Some(Self {
            route_id: safest.route_id.clone(),
            baseline_route_id: baseline.route_id.clone(),
            safety_score: safest.safety.score,
            extra_distance_mi: safest.distance_mi - baseline.distance_mi,
            extra_duration_seconds: safest.duration_seconds - baseline.duration_seconds,
        })
    }
}

#[derive(Debug)]
pub struct RouteComparison {
    pub routes: RouteOutcome,
    pub baseline: BaselineOutcome,
    pub tradeoff: Option<Tradeoff>,
}

#[derive(serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RouteOutcomeView<'a> {
    Routes { routes: &'a [RoutePlan] },
    Failed { reason: String },
}

#[derive(serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum BaselineOutcomeView<'a> {
    Route { route: &'a RoutePlan },
    Disabled,
    Failed { reason: String },
}

#[derive(serde::Serialize)]
struct RouteComparisonView<'a> {
    routes: &'a RouteOutcome,
    baseline: &'a BaselineOutcome,
    tradeoff: &'a Option<Tradeoff>,
}

impl Serialize for RouteOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Routes(routes) => RouteOutcomeView::Routes { routes },
            Self::Failed(err) => RouteOutcomeView::Failed {
                reason: err.to_string(),
            },
        }
        .serialize(serializer)
    }
}

impl Serialize for BaselineOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Route(route) => BaselineOutcomeView::Route { route },
            Self::Disabled => BaselineOutcomeView::Disabled,
            Self::Failed(err) => BaselineOutcomeView::Failed {
                reason: err.to_string(),
            },
        }
        .serialize(serializer)
    }
}

impl Serialize for RouteComparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RouteComparisonView {
            routes: &self.routes,
            baseline: &self.baseline,
            tradeoff: &self.tradeoff,
        }
        .serialize(serializer)
    }
}
