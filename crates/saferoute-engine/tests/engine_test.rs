//! End-to-end engine behavior against mocked providers.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use saferoute_core::{Coordinate, Hazard, HazardRules, HazardType, RouteMode, Severity};
use saferoute_engine::{
    BaselineOutcome, ManualClock, RouteOutcome, RouteSafetyEngine, SharedHazards,
};
use saferoute_providers::{
    AvoidanceClient, AvoidanceSettings, BaselineClient, BaselineSettings, ProviderError,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIRECTIONS_PATH: &str = "/v2/directions/driving-car/geojson";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 20, 12, 0, 0).unwrap()
}

fn origin() -> Coordinate {
    Coordinate::new(34.05, -118.25)
}

fn destination() -> Coordinate {
    Coordinate::new(34.25, -118.05)
}

fn hazard(id: &str, severity: Severity, lat: f64, lon: f64, age_hours: i64) -> Hazard {
    Hazard {
        id: id.to_string(),
        hazard_type: HazardType::Wildfire,
        severity,
        latitude: lat,
        longitude: lon,
        timestamp: (now() - ChronoDuration::hours(age_hours)).to_rfc3339(),
        source: "calfire".to_string(),
    }
}

fn engine(
    hazards: Vec<Hazard>,
    avoidance_url: &str,
    baseline_url: Option<&str>,
) -> RouteSafetyEngine {
    engine_with_rules(hazards, avoidance_url, baseline_url, HazardRules::default())
}

fn engine_with_rules(
    hazards: Vec<Hazard>,
    avoidance_url: &str,
    baseline_url: Option<&str>,
    rules: HazardRules,
) -> RouteSafetyEngine {
    let client = reqwest::Client::new();
    let avoidance = AvoidanceClient::new(
        client.clone(),
        AvoidanceSettings {
            base_url: avoidance_url.to_string(),
            api_key: Some("ors-key".to_string()),
            timeout: Duration::from_secs(2),
        },
    );
    let baseline = BaselineClient::new(
        client,
        BaselineSettings {
            base_url: baseline_url.unwrap_or("http://127.0.0.1:9").to_string(),
            api_key: baseline_url.map(|_| "gh-key".to_string()),
            timeout: Duration::from_secs(2),
        },
    );
    RouteSafetyEngine::new(Arc::new(hazards), rules, avoidance, baseline)
        .with_clock(Arc::new(ManualClock::new(now())))
}

fn directions_body() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": [[-118.25, 34.05], [-118.15, 34.15], [-118.05, 34.25]] },
            "properties": {
                "summary": { "distance": 30577.46, "duration": 1500.0 },
                "segments": [{ "steps": [] }]
            }
        }]
    })
}

async fn mock_directions(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(DIRECTIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(directions_body()))
        .mount(server)
        .await;
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests[0].body).unwrap()
}

#[test]
fn origin_inside_critical_buffer_is_not_avoided() {
    let at_origin = hazard("fire-a", Severity::Critical, 34.05, -118.25, 1);
    let engine = engine(vec![at_origin], "http://127.0.0.1:9", None);

    let plan = engine.get_disaster_polygons(origin(), destination()).unwrap();
    assert!(plan.avoidance_regions.is_empty());
    assert_eq!(plan.active_hazards.len(), 1);
    assert_eq!(plan.contained_hazard_ids, vec!["fire-a".to_string()]);
}

#[test]
fn co_located_hazards_are_each_excluded() {
    let hazards = vec![
        hazard("fire-crit", Severity::Critical, 34.05, -118.25, 1),
        hazard("fire-high", Severity::High, 34.05, -118.25, 1),
    ];
    let engine = engine(hazards, "http://127.0.0.1:9", None);

    let plan = engine.get_disaster_polygons(origin(), destination()).unwrap();
    assert_eq!(plan.avoidance_regions.len(), 0);
    assert_eq!(plan.active_hazards.len(), 2);
    assert!(plan.is_origin_contained());
}

#[test]
fn containment_uses_radius_not_exact_match() {
    // Roughly 2 miles north of the origin, inside a 5 mile critical buffer.
    let nearby = hazard("fire-c", Severity::Critical, 34.079, -118.25, 1);
    let engine = engine(vec![nearby], "http://127.0.0.1:9", None);

    let plan = engine
        .get_disaster_polygons(Coordinate::new(34.0505, -118.2501), destination())
        .unwrap();
    assert!(plan.avoidance_regions.is_empty());
    assert_eq!(plan.active_hazards.len(), 1);
}

#[test]
fn stale_and_non_routable_hazards_are_ignored() {
    let mut drought = hazard("drought-1", Severity::High, 34.5, -118.5, 1);
    drought.hazard_type = HazardType::Drought;
    let hazards = vec![
        hazard("fresh", Severity::High, 34.5, -118.5, 47),
        hazard("stale", Severity::High, 34.5, -118.5, 72),
        drought,
    ];
    let engine = engine(hazards, "http://127.0.0.1:9", None);

    let plan = engine.get_disaster_polygons(origin(), destination()).unwrap();
    let ids: Vec<_> = plan.active_hazards.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["fresh"]);
}

#[test]
fn disaster_polygons_are_idempotent() {
    let hazards = vec![
        hazard("a", Severity::Medium, 34.6, -118.6, 2),
        hazard("b", Severity::Critical, 34.8, -118.1, 5),
    ];
    let engine = engine(hazards, "http://127.0.0.1:9", None);

    let first = engine.get_disaster_polygons(origin(), destination()).unwrap();
    let second = engine.get_disaster_polygons(origin(), destination()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.avoidance_regions.len(), 2);
}

#[test]
fn replaced_hazards_show_up_in_the_next_request() {
    let shared = Arc::new(SharedHazards::default());
    let engine = RouteSafetyEngine::new(
        shared.clone(),
        HazardRules::default(),
        AvoidanceClient::new(reqwest::Client::new(), AvoidanceSettings::default()),
        BaselineClient::new(reqwest::Client::new(), BaselineSettings::default()),
    )
    .with_clock(Arc::new(ManualClock::new(now())));

    let before = engine.get_disaster_polygons(origin(), destination()).unwrap();
    assert!(before.active_hazards.is_empty());

    shared.replace(vec![hazard("new", Severity::Low, 34.6, -118.6, 0)]);
    let after = engine.get_disaster_polygons(origin(), destination()).unwrap();
    assert_eq!(after.active_hazards.len(), 1);
}

#[tokio::test]
async fn network_failure_yields_failed_outcome_and_no_routes() {
    let engine = engine(Vec::new(), "http://127.0.0.1:1", None);

    let outcome = engine
        .calculate_routes(origin(), destination(), true, 1)
        .await;
    assert!(outcome.failure().is_some());
    assert!(outcome.into_routes().is_empty());
}

#[tokio::test]
async fn route_near_critical_hazard_scores_low() {
    let server = MockServer::start().await;
    mock_directions(&server).await;

    // About 0.07 mi from the middle vertex, far from the origin.
    let near_route = hazard("fire-e", Severity::Critical, 34.151, -118.15, 3);
    let engine = engine(vec![near_route], &server.uri(), None);

    let routes = match engine
        .calculate_routes(origin(), destination(), true, 1)
        .await
    {
        RouteOutcome::Routes(routes) => routes,
        RouteOutcome::Failed(err) => panic!("unexpected failure: {err}"),
    };

    assert_eq!(routes.len(), 1);
    let safety = routes[0].safety;
    assert!(safety.analyzed);
    assert!(safety.score < 80.0, "score was {}", safety.score);
    assert!(safety.nearby_count > 0);
    assert!(safety.min_distance_mi.unwrap() < 0.1);

    let body = sent_body(&server).await;
    let polygons = body["options"]["avoid_polygons"]["coordinates"]
        .as_array()
        .unwrap();
    assert_eq!(polygons.len(), 1);
}

#[tokio::test]
async fn avoid_disabled_sends_no_polygons_but_still_scores() {
    let server = MockServer::start().await;
    mock_directions(&server).await;

    let far = hazard("fire-far", Severity::Critical, 34.9, -117.2, 3);
    let engine = engine(vec![far], &server.uri(), None);

    let routes = engine
        .calculate_routes(origin(), destination(), false, 1)
        .await
        .into_routes();

    assert_eq!(routes.len(), 1);
    assert!(routes[0].safety.analyzed);
    assert!(routes[0].safety.min_distance_mi.is_some());
    assert!(sent_body(&server).await.get("options").is_none());
}

#[tokio::test]
async fn no_hazards_means_perfect_score_and_plain_request() {
    let server = MockServer::start().await;
    mock_directions(&server).await;
    let engine = engine(Vec::new(), &server.uri(), None);

    let routes = engine
        .calculate_routes(origin(), destination(), true, 1)
        .await
        .into_routes();

    assert_eq!(routes[0].safety.score, 100.0);
    assert_eq!(routes[0].safety.nearby_count, 0);
    assert_eq!(routes[0].safety.min_distance_mi, None);
    assert!(sent_body(&server).await.get("options").is_none());
}

#[tokio::test]
async fn invalid_origin_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(directions_body()))
        .expect(0)
        .mount(&server)
        .await;
    let engine = engine(Vec::new(), &server.uri(), None);

    let outcome = engine
        .calculate_routes(Coordinate::new(0.0, 200.0), destination(), true, 1)
        .await;
    assert!(outcome.failure().is_some_and(|err| err.is_input_error()));
}

#[tokio::test]
async fn baseline_without_key_is_disabled() {
    let engine = engine(Vec::new(), "http://127.0.0.1:9", None);
    let outcome = engine
        .calculate_baseline_route(origin(), destination(), RouteMode::Fastest)
        .await;
    assert!(matches!(outcome, BaselineOutcome::Disabled));
}

#[tokio::test]
async fn compare_reports_tradeoff_against_baseline() {
    let server = MockServer::start().await;
    mock_directions(&server).await;
    Mock::given(method("GET"))
        .and(path("/route"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paths": [{
                "distance": 32186.8,
                "time": 1_800_000,
                "points": "_p~iF~ps|U_ulLnnqC_mqNvxq`@",
                "instructions": []
            }]
        })))
        .mount(&server)
        .await;

    let engine = engine(Vec::new(), &server.uri(), Some(&server.uri()));
    let comparison = engine
        .compare_routes(origin(), destination(), 1, RouteMode::Fastest)
        .await;

    let baseline = comparison.baseline.route().unwrap();
    assert!(baseline.is_baseline);
    assert!(!baseline.safety.analyzed);

    let tradeoff = comparison.tradeoff.as_ref().unwrap();
    assert_eq!(tradeoff.route_id, "openrouteservice-0");
    assert_eq!(tradeoff.safety_score, 100.0);
    assert!((tradeoff.extra_distance_mi + 1.0).abs() < 1e-6);
    assert!((tradeoff.extra_duration_seconds + 300.0).abs() < 1e-6);

    let value = serde_json::to_value(&comparison).unwrap();
    assert_eq!(value["routes"]["status"], "routes");
    assert_eq!(value["baseline"]["status"], "route");
}

#[tokio::test]
async fn compare_without_baseline_has_no_tradeoff() {
    let server = MockServer::start().await;
    mock_directions(&server).await;
    let engine = engine(Vec::new(), &server.uri(), None);

    let comparison = engine
        .compare_routes(origin(), destination(), 1, RouteMode::Shortest)
        .await;
    assert_eq!(comparison.routes.routes().len(), 1);
    assert!(matches!(comparison.baseline, BaselineOutcome::Disabled));
    assert!(comparison.tradeoff.is_none());
}

#[tokio::test]
async fn configured_polygon_segments_shape_the_request() {
    let server = MockServer::start().await;
    mock_directions(&server).await;

    let rules = HazardRules {
        polygon_segments: 32,
        ..HazardRules::default()
    };
    let far = hazard("fire-far", Severity::High, 34.6, -118.6, 2);
    let engine = engine_with_rules(vec![far], &server.uri(), None, rules);

    let outcome = engine
        .calculate_routes(origin(), destination(), true, 1)
        .await;
    assert!(outcome.failure().is_none());

    let body = sent_body(&server).await;
    let ring = body["options"]["avoid_polygons"]["coordinates"][0][0]
        .as_array()
        .unwrap();
    assert_eq!(ring.len(), 33);
}

#[tokio::test]
async fn back_to_back_requests_respect_min_interval() {
    let server = MockServer::start().await;
    mock_directions(&server).await;
    let engine = engine(Vec::new(), &server.uri(), None)
        .with_min_call_interval(Duration::from_millis(300));

    let started = Instant::now();
    let first = engine
        .calculate_routes(origin(), destination(), true, 1)
        .await;
    let second = engine
        .calculate_routes(origin(), destination(), true, 1)
        .await;

    // The clock is frozen, so the second call waits out the full interval.
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(first.routes().len(), 1);
    assert_eq!(second.routes().len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn baseline_server_error_is_a_failed_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/route"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;
    let engine = engine(Vec::new(), "http://127.0.0.1:9", Some(&server.uri()));

    let outcome = engine
        .calculate_baseline_route(origin(), destination(), RouteMode::Fastest)
        .await;
    match outcome {
        BaselineOutcome::Failed(ProviderError::Status { status, .. }) => assert_eq!(status, 502),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn disabled_avoidance_provider_fails_without_network() {
    let engine = RouteSafetyEngine::new(
        Arc::new(Vec::<Hazard>::new()),
        HazardRules::default(),
        AvoidanceClient::new(reqwest::Client::new(), AvoidanceSettings::default()),
        BaselineClient::new(reqwest::Client::new(), BaselineSettings::default()),
    );

    let outcome = engine
        .calculate_routes(origin(), destination(), true, 1)
        .await;
    assert!(matches!(outcome.failure(), Some(ProviderError::Disabled(_))));
}
