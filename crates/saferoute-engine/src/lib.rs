//! SafeRoute engine - request-scoped orchestration of hazard filtering,
//! avoidance routing, exposure scoring and baseline comparison.

pub mod config;
pub mod engine;
pub mod outcome;
pub mod source;
pub mod throttle;

pub use config::Config;
pub use engine::{EngineError, RouteSafetyEngine};
pub use outcome::{BaselineOutcome, RouteComparison, RouteOutcome, Tradeoff};
pub use source::{Clock, HazardSource, ManualClock, SharedHazards, SystemClock};
pub use throttle::CallThrottle;
