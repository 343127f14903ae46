//! Street network storage and shortest-path search.
//!
//! The street graph is kept in column stores (`VertexStore`, `EdgeStore`) and read
//! through lightweight cursors. `StreetLayer` ties the stores together with adjacency
//! lists and a spatial index, and `StreetRouter` runs label-correcting searches over it.

pub mod error;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use model::{
    AccessPermission, EdgeFlags, EdgeStore, Split, StreetLayer, TransportMode,
    TraversalPermission, VertexStore,
};
pub use routing::{RoutingRequest, State, StateId, StreetPath, StreetRouter};

/// Index of a vertex in the `VertexStore`
pub type VertexIndex = usize;
/// Index of a directed edge in the `EdgeStore` (even = forward, odd = backward)
pub type EdgeIndex = usize;
/// Search weight: distance in millimeters
pub type Weight = u64;
/// Identifier taken from the source data (OSM id)
pub type SourceId = i64;

/// Default snapping radius used when a caller does not supply one
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 300.0;
/// Default distance limit of exhaustive searches
pub const DEFAULT_DISTANCE_LIMIT_METERS: u32 = 2_000;
