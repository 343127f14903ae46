//! Point-to-point trip planning on top of the street search

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use streetrouter_core::prelude::*;

use crate::config::RouterConfig;
use crate::itinerary::{Itinerary, TripEnds, build_itinerary};

/// A coordinate with an optional caller-supplied name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            name: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub from: Location,
    pub to: Location,
    /// Departure time, or arrival time when `arrive_by` is set
    pub date_time: NaiveDateTime,
    pub arrive_by: bool,
    pub mode: Option<TransportMode>,
    /// Requested walk limit; the configured default applies when absent
    pub max_walk_meters: Option<f64>,
}

impl PlanRequest {
    pub fn new(from: Location, to: Location, date_time: NaiveDateTime) -> Self {
        Self {
            from,
            to,
            date_time,
            arrive_by: false,
            mode: Some(TransportMode::Foot),
            max_walk_meters: None,
        }
    }
}

/// Best path found toward one endpoint of the target split
struct Candidate {
    path: StreetPath,
    /// Path weight plus the remaining distance along the target edge
    total_mm: u64,
    remaining_ms: u64,
    /// Trip runs directly along the edge both points are snapped to
    along_edge: bool,
}

/// Plans a street trip between two coordinates.
///
/// Both coordinates are snapped to the network. Arrive-by requests search
/// backwards from the destination. The search is run once toward each endpoint
/// of the target edge and the cheaper result, counting the distance still to go
/// along that edge, is kept. Points snapped to the same edge may also be joined
/// directly along it.
pub fn plan(
    layer: &StreetLayer,
    config: &RouterConfig,
    request: &PlanRequest,
) -> Result<Itinerary, Error> {
    let radius = config.search_radius_meters;
    let from_split = layer.require_split(request.from.lat, request.from.lon, radius)?;
    let to_split = layer.require_split(request.to.lat, request.to.lon, radius)?;
    trace!("Snapped origin to {from_split:?}");
    trace!("Snapped destination to {to_split:?}");

    let (origin, target) = if request.arrive_by {
        (&to_split, &from_split)
    } else {
        (&from_split, &to_split)
    };

    let routing_request = config.routing_request(request.mode, request.arrive_by);
    let walk_limit = config.walk_limit_meters(request.max_walk_meters);
    let mut router = StreetRouter::new(layer, routing_request);
    router.set_distance_limit_meters(walk_limit);

    let mut best = along_edge(layer, &routing_request, &from_split, &to_split);
    for (vertex, remaining_mm, toward_point) in [
        (target.vertex0, target.distance0_mm, target.edge),
        (target.vertex1, target.distance1_mm, target.edge + 1),
    ] {
        // Arrive-by searches end at the trip start, which leaves the point
        let last_edge_index = if request.arrive_by {
            toward_point ^ 1
        } else {
            toward_point
        };
        let last_edge = layer.edge(last_edge_index);
        if !allows_mode(&routing_request, &last_edge) {
            debug!("Edge {last_edge_index} does not allow the requested mode");
            continue;
        }

        router.set_origin_split(origin);
        router.set_target_vertex(vertex);
        router.route();

        let Some(terminal) = router.last_state() else {
            debug!("No path to target vertex {vertex}");
            continue;
        };
        let path = StreetPath::new(&router, Some(terminal), request.arrive_by)?;
        let total_mm = path.weight() + u64::from(remaining_mm);
        debug!("Path to vertex {vertex}: {total_mm} mm");

        if best.as_ref().is_none_or(|b| total_mm < b.total_mm) {
            let remaining_ms = routing_request
                .travel_time_ms(remaining_mm, &last_edge)
                .unsigned_abs();
            best = Some(Candidate {
                path,
                total_mm,
                remaining_ms,
                along_edge: false,
            });
        }
    }

    let Candidate {
        path,
        total_mm,
        remaining_ms,
        along_edge,
    } = best.ok_or(Error::PathNotFound)?;

    let duration = TimeDelta::milliseconds(
        i64::try_from(path.duration_ms() + remaining_ms).unwrap_or(i64::MAX),
    );
    let (start_time, end_time) = if request.arrive_by {
        (request.date_time - duration, request.date_time)
    } else {
        (request.date_time, request.date_time + duration)
    };

    let mut itinerary = build_itinerary(
        layer,
        &path,
        &TripEnds {
            from: &from_split,
            to: &to_split,
            from_name: request.from.name.as_deref(),
            to_name: request.to.name.as_deref(),
            start_time,
            end_time,
            distance_mm: total_mm,
            mode: request.mode,
            along_edge,
        },
    );
    itinerary.walk_limit_exceeded = itinerary.walk_distance_m > f64::from(walk_limit);
    Ok(itinerary)
}

/// Direct trip between two points snapped to the same edge pair.
///
/// Travels the forward edge when the destination lies further from vertex0.
/// `None` when the points are on different edges or that direction is closed
/// to the requested mode.
fn along_edge(
    layer: &StreetLayer,
    request: &RoutingRequest,
    from: &Split,
    to: &Split,
) -> Option<Candidate> {
    if from.edge != to.edge {
        return None;
    }
    let (edge_index, toward) = if to.distance0_mm >= from.distance0_mm {
        (from.edge, from.vertex1)
    } else {
        (from.edge + 1, from.vertex0)
    };
    let edge = layer.edge(edge_index);
    if !allows_mode(request, &edge) {
        debug!("Edge {edge_index} does not allow the requested mode");
        return None;
    }

    let distance_mm = from.distance0_mm.abs_diff(to.distance0_mm);
    debug!("Both points lie on edge {edge_index}, {distance_mm} mm apart");
    Some(Candidate {
        path: StreetPath::at_vertex(toward),
        total_mm: u64::from(distance_mm),
        remaining_ms: request.travel_time_ms(distance_mm, &edge).unsigned_abs(),
        along_edge: true,
    })
}

fn allows_mode(request: &RoutingRequest, edge: &Edge<'_>) -> bool {
    request
        .mode
        .is_none_or(|mode| edge.flag(mode.allows_flag()))
}

/// Plans many independent trips in parallel, one router per request.
pub fn plan_many(
    layer: &StreetLayer,
    config: &RouterConfig,
    requests: &[PlanRequest],
) -> Vec<Result<Itinerary, Error>> {
    requests
        .par_iter()
        .map(|request| plan(layer, config, request))
        .collect()
}
