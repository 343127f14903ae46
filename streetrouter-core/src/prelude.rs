pub use crate::{DEFAULT_DISTANCE_LIMIT_METERS, DEFAULT_SEARCH_RADIUS_METERS};

// Street graph storage
pub use crate::model::streets::edge_store::{Edge, EdgeStore};
pub use crate::model::streets::flags::{
    AccessPermission, EdgeFlags, TransportMode, TraversalPermission,
};
pub use crate::model::streets::vertex_store::{
    Vertex, VertexStore, fixed_to_floating, floating_to_fixed,
};
pub use crate::model::{Split, StreetLayer};

// Search
pub use crate::routing::{RoutingRequest, State, StateId, StreetPath, StreetRouter};

// Core types
pub use crate::Error;
pub use crate::{EdgeIndex, SourceId, VertexIndex, Weight};
