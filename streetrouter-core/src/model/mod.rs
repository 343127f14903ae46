//! Data model of the street network
//!
//! Contains the column stores for vertices and edges, the flag bitset,
//! and the layer that indexes them for routing.

pub mod streets;

// Re-export of the main model structures
pub use streets::edge_store::{Edge, EdgeStore};
pub use streets::flags::{AccessPermission, EdgeFlags, TransportMode, TraversalPermission};
pub use streets::network::StreetLayer;
pub use streets::split::Split;
pub use streets::vertex_store::{Vertex, VertexStore};
