//! Label-correcting search over the street layer and path reconstruction

mod path;
mod request;
mod state;
mod street_router;

pub use path::StreetPath;
pub use request::RoutingRequest;
pub use state::{State, StateId};
pub use street_router::StreetRouter;
