//! Reachability trees for isochrone-style consumers

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use streetrouter_core::prelude::*;

use crate::config::RouterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReachedVertex {
    pub vertex: VertexIndex,
    pub lat: f64,
    pub lon: f64,
    pub distance_m: f64,
}

/// Every vertex reachable from an origin within the walk limit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachabilityTree {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub limit_m: u32,
    /// Ordered by vertex index
    pub reached: Vec<ReachedVertex>,
}

impl ReachabilityTree {
    pub fn len(&self) -> usize {
        self.reached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reached.is_empty()
    }

    pub fn distance_to(&self, vertex: VertexIndex) -> Option<f64> {
        self.reached
            .binary_search_by_key(&vertex, |r| r.vertex)
            .ok()
            .map(|i| self.reached[i].distance_m)
    }
}

/// Runs an exhaustive search from a coordinate.
///
/// `limit_m` goes through the configured default and clamp.
pub fn reachability(
    layer: &StreetLayer,
    config: &RouterConfig,
    lat: f64,
    lon: f64,
    limit_m: Option<f64>,
    mode: Option<TransportMode>,
) -> Result<ReachabilityTree, Error> {
    let split = layer.require_split(lat, lon, config.search_radius_meters)?;
    let limit = config.walk_limit_meters(limit_m);

    let mut router = StreetRouter::new(layer, config.routing_request(mode, false));
    router.set_distance_limit_meters(limit);
    router.set_origin_split(&split);
    router.route();

    #[allow(clippy::cast_precision_loss)]
    let reached: Vec<_> = router
        .reachability_tree()
        .into_iter()
        .map(|(vertex, weight)| {
            let cursor = layer.vertex(vertex);
            ReachedVertex {
                vertex,
                lat: cursor.lat(),
                lon: cursor.lon(),
                distance_m: weight as f64 / 1000.0,
            }
        })
        .collect();
    debug!("Reached {} vertices within {limit} m", reached.len());

    Ok(ReachabilityTree {
        origin_lat: lat,
        origin_lon: lon,
        limit_m: limit,
        reached,
    })
}

/// Computes reachability trees for many origins in parallel.
///
/// Origins that cannot be snapped yield `None`.
pub fn bulk_reachability(
    layer: &StreetLayer,
    config: &RouterConfig,
    origins: &[(f64, f64)],
    limit_m: Option<f64>,
    mode: Option<TransportMode>,
) -> Vec<Option<ReachabilityTree>> {
    origins
        .par_iter()
        .map(
            |&(lat, lon)| match reachability(layer, config, lat, lon, limit_m, mode) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    warn!("Reachability failed for ({lat}, {lon}): {e}");
                    None
                }
            },
        )
        .collect()
}
