//! Request orchestration: hazards in, scored routes out.

use crate::config::Config;
use crate::outcome::{BaselineOutcome, RouteComparison, RouteOutcome, Tradeoff};
use crate::source::{Clock, HazardSource, SystemClock};
use crate::throttle::CallThrottle;
use saferoute_core::{
    active_hazards, build_avoidance_plan, score_route, AvoidancePlan, Coordinate, CoordinateError,
    HazardRules, RouteMode,
};
use saferoute_providers::{AvoidanceClient, BaselineClient, ProviderError};
use std::sync::Arc;
use thiserror::Error;

const USER_AGENT: &str = concat!("saferoute/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub struct RouteSafetyEngine {
    hazards: Arc<dyn HazardSource>,
    clock: Arc<dyn Clock>,
    rules: HazardRules,
    avoidance: AvoidanceClient,
    baseline: BaselineClient,
    avoidance_throttle: CallThrottle,
    baseline_throttle: CallThrottle,
}

impl RouteSafetyEngine {
    pub fn new(
        hazards: Arc<dyn HazardSource>,
        rules: HazardRules,
        avoidance: AvoidanceClient,
        baseline: BaselineClient,
    ) -> Self {
        Self {
            hazards,
            clock: Arc::new(SystemClock),
            rules,
            avoidance,
            baseline,
            avoidance_throttle: CallThrottle::disabled(),
            baseline_throttle: CallThrottle::disabled(),
        }
    }

    /// Wire up both providers from `config`, sharing one connection pool.
    pub fn from_config(
        config: &Config,
        hazards: Arc<dyn HazardSource>,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let avoidance = AvoidanceClient::new(client.clone(), config.avoidance_settings());
        let baseline = BaselineClient::new(client, config.baseline_settings());

        if !avoidance.is_enabled() {
            tracing::warn!("No avoidance routing key configured, route requests will fail");
        }
        if !baseline.is_enabled() {
            tracing::info!("No baseline routing key configured, baseline comparison disabled");
        }

        Ok(Self::new(hazards, config.hazard_rules(), avoidance, baseline)
            .with_min_call_interval(config.min_call_interval()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_min_call_interval(mut self, interval: std::time::Duration) -> Self {
        self.avoidance_throttle = CallThrottle::new(interval);
        self.baseline_throttle = CallThrottle::new(interval);
        self
    }

    pub fn rules(&self) -> &HazardRules {
        &self.rules
    }

    pub fn avoidance_enabled(&self) -> bool {
        self.avoidance.is_enabled()
    }

    pub fn baseline_enabled(&self) -> bool {
        self.baseline.is_enabled()
    }

    /// Avoidance regions and active hazards for a trip, from the current
    /// hazard snapshot. Repeated calls with unchanged inputs agree.
    pub fn get_disaster_polygons(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<AvoidancePlan, CoordinateError> {
        origin.validate()?;
        destination.validate()?;

        let snapshot = self.hazards.snapshot();
        let active = active_hazards(&snapshot, self.clock.now(), &self.rules);
        let plan = build_avoidance_plan(origin, active, &self.rules);

        tracing::debug!(
            "Hazard plan: {} of {} hazards active, {} avoidance regions, {} containing origin",
            plan.active_hazards.len(),
            snapshot.len(),
            plan.avoidance_regions.len(),
            plan.contained_hazard_ids.len()
        );
        Ok(plan)
    }

    /// Candidate routes scored against every active hazard.
    ///
    /// With `avoid_disasters` off no regions are sent upstream, but the
    /// returned routes are still scored.
    pub async fn calculate_routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        avoid_disasters: bool,
        alternatives: usize,
    ) -> RouteOutcome {
        let plan = match self.get_disaster_polygons(origin, destination) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!("Rejected route request: {}", err);
                return RouteOutcome::Failed(err.into());
            }
        };
        if !self.avoidance.is_enabled() {
            let err = ProviderError::Disabled(self.avoidance.provider_name());
            tracing::warn!("Route request not sent: {}", err);
            return RouteOutcome::Failed(err);
        }

        let polygons = if avoid_disasters {
            plan.polygons(self.rules.polygon_segments)
        } else {
            Vec::new()
        };

        self.wait_for_slot(&self.avoidance_throttle).await;
        let routes = match self
            .avoidance
            .calculate_routes(origin, destination, &polygons, alternatives)
            .await
        {
            Ok(routes) => routes,
            Err(err) => return RouteOutcome::Failed(err),
        };

        let scored: Vec<_> = routes
            .into_iter()
            .map(|route| {
                let safety =
                    score_route(&route.geometry, &plan.active_hazards, &self.rules.severities);
                route.with_safety(safety)
            })
            .collect();

        tracing::info!(
            "Calculated {} routes avoiding {} regions ({} active hazards)",
            scored.len(),
            polygons.len(),
            plan.active_hazards.len()
        );
        RouteOutcome::Routes(scored)
    }

    /// Hazard-agnostic reference route. Never scored.
    pub async fn calculate_baseline_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: RouteMode,
    ) -> BaselineOutcome {
        if !self.baseline.is_enabled() {
            return BaselineOutcome::Disabled;
        }

        self.wait_for_slot(&self.baseline_throttle).await;
        match self
            .baseline
            .calculate_baseline_route(origin, destination, mode)
            .await
        {
            Ok(route) => BaselineOutcome::Route(route),
            Err(ProviderError::Disabled(_)) => BaselineOutcome::Disabled,
            Err(err) => BaselineOutcome::Failed(err),
        }
    }

    /// Run avoidance routing and the baseline concurrently and measure the
    /// safest candidate against the baseline.
    pub async fn compare_routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        alternatives: usize,
        mode: RouteMode,
    ) -> RouteComparison {
        let (routes, baseline) = tokio::join!(
            self.calculate_routes(origin, destination, true, alternatives),
            self.calculate_baseline_route(origin, destination, mode)
        );

        let tradeoff = baseline
            .route()
            .and_then(|base| Tradeoff::safest(routes.routes(), base));

        RouteComparison {
            routes,
            baseline,
            tradeoff,
        }
    }

    async fn wait_for_slot(&self, throttle: &CallThrottle) {
        let wait = throttle.reserve(self.clock.now());
        if !wait.is_zero() {
            tracing::debug!("Throttling provider call for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
