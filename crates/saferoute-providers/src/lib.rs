//! Routing provider clients.
//!
//! Two upstreams are wrapped here: an avoidance-capable directions API that
//! accepts exclusion polygons, and a hazard-agnostic baseline API whose
//! geometry arrives as an encoded polyline.

pub mod avoidance;
pub mod baseline;
pub mod convert;
pub mod error;

pub use avoidance::{AvoidanceClient, AvoidanceSettings};
pub use baseline::{BaselineClient, BaselineSettings};
pub use error::ProviderError;
