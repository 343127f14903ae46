//! Trip itineraries built from street paths

use chrono::NaiveDateTime;
use geo::{Bearing, Coord, Haversine, LineString, Point};
use serde::Serialize;
use streetrouter_core::prelude::*;

/// Start or end of a leg
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Street vertex the route enters or leaves the network at
    pub vertex: VertexIndex,
    /// Name given by the caller, if any
    pub orig: Option<String>,
}

/// Consecutive edges on the same street
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkStep {
    pub street_name: String,
    pub distance_m: f64,
    /// Where the step starts
    pub lat: f64,
    pub lon: f64,
    pub bogus_name: bool,
    /// Initial bearing of the first edge, degrees clockwise from north
    pub bearing_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub mode: Option<TransportMode>,
    pub from: Place,
    pub to: Place,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub distance_m: f64,
    pub geometry: LineString<f64>,
    pub walk_steps: Vec<WalkStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub from: Place,
    pub to: Place,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_ms: u64,
    pub walk_distance_m: f64,
    pub walk_limit_exceeded: bool,
    pub legs: Vec<Leg>,
}

/// Everything about a trip that is not part of the street path itself
#[derive(Debug, Clone, Copy)]
pub(crate) struct TripEnds<'a> {
    pub from: &'a Split,
    pub to: &'a Split,
    pub from_name: Option<&'a str>,
    pub to_name: Option<&'a str>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Path weight plus the distance left along the destination edge
    pub distance_mm: u64,
    pub mode: Option<TransportMode>,
    /// Both points share one edge and the trip stays on it
    pub along_edge: bool,
}

pub(crate) fn build_itinerary(
    layer: &StreetLayer,
    path: &StreetPath,
    ends: &TripEnds<'_>,
) -> Itinerary {
    let from = place(layer, path.start_vertex(), ends.from, ends.from_name);
    let to = place(layer, path.end_vertex(), ends.to, ends.to_name);

    #[allow(clippy::cast_precision_loss)]
    let distance_m = ends.distance_mm as f64 / 1000.0;
    let steps = if ends.along_edge {
        vec![along_edge_step(layer, ends.from, ends.to, distance_m)]
    } else {
        walk_steps(layer, path.edges())
    };
    let leg = Leg {
        mode: ends.mode,
        from: from.clone(),
        to: to.clone(),
        start_time: ends.start_time,
        end_time: ends.end_time,
        distance_m,
        geometry: leg_geometry(layer, path, ends),
        walk_steps: steps,
    };

    Itinerary {
        from,
        to,
        start_time: ends.start_time,
        end_time: ends.end_time,
        duration_ms: (ends.end_time - ends.start_time)
            .num_milliseconds()
            .unsigned_abs(),
        walk_distance_m: distance_m,
        walk_limit_exceeded: false,
        legs: vec![leg],
    }
}

/// Groups consecutive edges into steps by street name.
///
/// Text in parentheses is ignored when comparing names, so "Main Street (north)"
/// continues a "Main Street" step.
pub fn walk_steps(layer: &StreetLayer, edges: &[EdgeIndex]) -> Vec<WalkStep> {
    let mut steps: Vec<WalkStep> = Vec::new();
    let mut current_street: Option<&str> = None;

    for &edge_index in edges {
        let edge = layer.edge(edge_index);
        let name = edge.name();
        let street = without_parentheses(name);

        match steps.last_mut() {
            Some(step) if current_street == Some(street) => {
                step.distance_m += edge.length_m();
            }
            _ => {
                let start = layer.vertex(edge.from_vertex());
                let geometry = edge.geometry();
                let bearing_deg = match (geometry.0.first(), geometry.0.get(1)) {
                    (Some(&a), Some(&b)) => Haversine.bearing(Point::from(a), Point::from(b)),
                    _ => 0.0,
                };
                steps.push(WalkStep {
                    street_name: name.to_owned(),
                    distance_m: edge.length_m(),
                    lat: start.lat(),
                    lon: start.lon(),
                    bogus_name: edge.has_bogus_name(),
                    bearing_deg,
                });
                current_street = Some(street);
            }
        }
    }
    steps
}

fn without_parentheses(name: &str) -> &str {
    match name.find('(') {
        Some(idx) if idx > 0 => name[..idx].trim_end(),
        _ => name,
    }
}

fn place(layer: &StreetLayer, vertex: VertexIndex, split: &Split, orig: Option<&str>) -> Place {
    let cursor = layer.vertex(vertex);
    let name = orig
        .map(str::to_owned)
        .or_else(|| cursor.name().map(str::to_owned))
        .unwrap_or_else(|| cursor.label());
    Place {
        name,
        lat: split.lat(),
        lon: split.lon(),
        vertex,
        orig: orig.map(str::to_owned),
    }
}

/// Single step between two points on the same edge
fn along_edge_step(layer: &StreetLayer, from: &Split, to: &Split, distance_m: f64) -> WalkStep {
    let edge = layer.edge(from.edge);
    WalkStep {
        street_name: edge.name().to_owned(),
        distance_m,
        lat: from.lat(),
        lon: from.lon(),
        bogus_name: edge.has_bogus_name(),
        bearing_deg: Haversine.bearing(from.point(), to.point()),
    }
}

/// Start point, the traversed geometry and end point as one line.
///
/// The partial geometry of both split edges is kept, so bent streets are
/// followed up to the snapped points.
fn leg_geometry(layer: &StreetLayer, path: &StreetPath, ends: &TripEnds<'_>) -> LineString<f64> {
    let (from, to) = (ends.from, ends.to);
    let mut coords: Vec<Coord<f64>> = vec![from.point().into()];
    let mut push = |coord: Coord<f64>| {
        if coords.last() != Some(&coord) {
            coords.push(coord);
        }
    };

    if ends.along_edge {
        let points = layer.edge(from.edge).geometry().0;
        if to.distance0_mm >= from.distance0_mm {
            let between = points.get(from.segment + 1..=to.segment).unwrap_or(&[]);
            between.iter().copied().for_each(&mut push);
        } else {
            let between = points.get(to.segment + 1..=from.segment).unwrap_or(&[]);
            between.iter().rev().copied().for_each(&mut push);
        }
    } else {
        let head = layer.edge(from.edge).geometry().0;
        points_toward(&head, from, path.start_vertex())
            .into_iter()
            .for_each(&mut push);
        for &edge in path.edges() {
            layer.edge(edge).geometry().into_iter().for_each(&mut push);
        }
        let tail = layer.edge(to.edge).geometry().0;
        points_toward(&tail, to, path.end_vertex())
            .into_iter()
            .rev()
            .for_each(&mut push);
    }
    push(to.point().into());

    LineString::new(coords)
}

/// Geometry points of a split edge from the split point out to `vertex`.
///
/// `points` is the forward geometry of the edge, from vertex0 to vertex1.
fn points_toward(points: &[Coord<f64>], split: &Split, vertex: VertexIndex) -> Vec<Coord<f64>> {
    if vertex == split.vertex0 {
        let before = points.get(..=split.segment).unwrap_or(&[]);
        before.iter().rev().copied().collect()
    } else if vertex == split.vertex1 {
        points.get(split.segment + 1..).unwrap_or(&[]).to_vec()
    } else {
        Vec::new()
    }
}
