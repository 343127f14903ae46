//! Street trip planning built on `streetrouter_core`.
//!
//! Adds configuration, itinerary building and batch queries (reachability trees,
//! distance matrices) over a shared, read-only `StreetLayer`. Batch functions
//! run one router per query on the rayon thread pool.

pub mod config;
pub mod isochrone;
pub mod itinerary;
pub mod matrix;
pub mod routing;

pub use config::RouterConfig;
pub use isochrone::{ReachabilityTree, ReachedVertex, bulk_reachability, reachability};
pub use itinerary::{Itinerary, Leg, Place, WalkStep, walk_steps};
pub use matrix::distance_matrix;
pub use routing::{Location, PlanRequest, plan, plan_many};

pub use streetrouter_core::Error;
pub use streetrouter_core::prelude;
