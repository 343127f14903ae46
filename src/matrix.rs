use log::warn;
use rayon::prelude::*;
use streetrouter_core::prelude::*;

use crate::config::RouterConfig;

/// Street distances in meters between every pair of points.
///
/// Runs one exhaustive search per origin in parallel, bounded by the clamped walk
/// limit. Cells are `None` when either point cannot be snapped or the destination
/// is out of reach.
pub fn distance_matrix(
    layer: &StreetLayer,
    config: &RouterConfig,
    points: &[(f64, f64)],
    mode: Option<TransportMode>,
) -> Vec<Vec<Option<f64>>> {
    let splits: Vec<Option<Split>> = points
        .iter()
        .map(|&(lat, lon)| {
            let split = layer.find_split(lat, lon, config.search_radius_meters);
            if split.is_none() {
                warn!("Point ({lat}, {lon}) is not near any street");
            }
            split
        })
        .collect();
    let limit = config.walk_limit_meters(Some(config.clamp_max_walk_meters));

    splits
        .par_iter()
        .enumerate()
        .map(|(i, origin)| {
            let Some(origin) = origin else {
                return vec![None; splits.len()];
            };
            let mut router = StreetRouter::new(layer, config.routing_request(mode, false));
            router.set_distance_limit_meters(limit);
            router.set_origin_split(origin);
            router.route();

            splits
                .iter()
                .enumerate()
                .map(|(j, target)| {
                    let target = target.as_ref()?;
                    if i == j {
                        return Some(0.0);
                    }
                    distance_mm(&router, origin, target).map(mm_to_m)
                })
                .collect()
        })
        .collect()
}

/// Shortest distance to a split point, through either endpoint of its edge or
/// directly along the edge when both points share it.
fn distance_mm(router: &StreetRouter<'_>, origin: &Split, target: &Split) -> Option<u64> {
    let via_vertex0 = router
        .weight_to_vertex(target.vertex0)
        .map(|w| w + u64::from(target.distance0_mm));
    let via_vertex1 = router
        .weight_to_vertex(target.vertex1)
        .map(|w| w + u64::from(target.distance1_mm));
    let along_edge = if origin.edge == target.edge {
        // Forward edge when the target lies further from vertex0
        let direction = if target.distance0_mm >= origin.distance0_mm {
            origin.edge
        } else {
            origin.edge + 1
        };
        let allowed = router
            .request()
            .mode
            .is_none_or(|mode| router.layer().edge(direction).flag(mode.allows_flag()));
        allowed.then(|| u64::from(origin.distance0_mm.abs_diff(target.distance0_mm)))
    } else {
        None
    };

    [via_vertex0, via_vertex1, along_edge]
        .into_iter()
        .flatten()
        .min()
}

#[allow(clippy::cast_precision_loss)]
fn mm_to_m(mm: u64) -> f64 {
    mm as f64 / 1000.0
}
