//! Street network model

pub mod edge_store;
pub mod flags;
pub mod names;
pub mod network;
pub mod split;
pub mod vertex_store;

pub use edge_store::{Edge, EdgeStore};
pub use flags::{AccessPermission, EdgeFlags, TransportMode, TraversalPermission};
pub use names::NameTable;
pub use network::StreetLayer;
pub use split::Split;
pub use vertex_store::{Vertex, VertexStore};
