use std::collections::BinaryHeap;

use geo::{Distance, Haversine, Point};
use hashbrown::HashMap;
use log::{debug, warn};

use super::request::RoutingRequest;
use super::state::{QueueEntry, State, StateId};
use crate::model::{Split, StreetLayer};
use crate::{DEFAULT_DISTANCE_LIMIT_METERS, EdgeIndex, VertexIndex, Weight};

/// Single-threaded label-correcting search over a `StreetLayer`
///
/// Without a target the search is exhaustive up to the distance limit. With a
/// target it stops as soon as the target is popped from the queue, ordering the
/// queue by weight plus the straight-line distance to the target.
///
/// Labels live in an arena owned by the router and are never mutated once
/// stored. The best-known table keeps one label per vertex; labels superseded
/// while still queued are skipped when popped.
#[derive(Debug)]
pub struct StreetRouter<'a> {
    layer: &'a StreetLayer,
    request: RoutingRequest,
    distance_limit_mm: Weight,
    states: Vec<State>,
    best_states: HashMap<VertexIndex, StateId>,
    queue: BinaryHeap<QueueEntry>,
    target: Option<(VertexIndex, Point<f64>)>,
    last_state: Option<StateId>,
}

impl<'a> StreetRouter<'a> {
    pub fn new(layer: &'a StreetLayer, request: RoutingRequest) -> Self {
        Self {
            layer,
            request,
            distance_limit_mm: Weight::from(DEFAULT_DISTANCE_LIMIT_METERS) * 1000,
            states: Vec::new(),
            best_states: HashMap::new(),
            queue: BinaryHeap::new(),
            target: None,
            last_state: None,
        }
    }

    pub fn layer(&self) -> &'a StreetLayer {
        self.layer
    }

    pub fn request(&self) -> &RoutingRequest {
        &self.request
    }

    /// Bounds exhaustive searches. Ignored while a target is set.
    pub fn set_distance_limit_meters(&mut self, meters: u32) {
        self.distance_limit_mm = Weight::from(meters) * 1000;
    }

    pub fn distance_limit_mm(&self) -> Weight {
        self.distance_limit_mm
    }

    /// Stops the search at `vertex` and enables goal direction.
    pub fn set_target_vertex(&mut self, vertex: VertexIndex) {
        self.target = Some((vertex, self.layer.vertex(vertex).point()));
    }

    /// Returns to an exhaustive search.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn target_vertex(&self) -> Option<VertexIndex> {
        self.target.map(|(vertex, _)| vertex)
    }

    /// Starts the next search from a single vertex with zero weight.
    pub fn set_origin_vertex(&mut self, vertex: VertexIndex) {
        self.reset();
        self.install(State::origin(vertex, self.request.arrive_by));
    }

    /// Starts the next search from a point on an edge.
    ///
    /// Seeds one label per endpoint of the split edge, pre-weighted with the
    /// distance from the split point. When a mode is set, an endpoint is only
    /// seeded if the edge leading to it (or from it, on arrive-by searches)
    /// allows that mode.
    pub fn set_origin_split(&mut self, split: &Split) {
        self.reset();

        let mut edge = self.layer.edge(split.edge);
        let endpoints = [
            (split.vertex0, split.distance0_mm, split.edge + 1),
            (split.vertex1, split.distance1_mm, split.edge),
        ];
        for (vertex, distance_mm, toward_vertex) in endpoints {
            // Departing searches travel toward the endpoint, arrive-by searches
            // travel from it toward the split point.
            let used_edge = if self.request.arrive_by {
                toward_vertex ^ 1
            } else {
                toward_vertex
            };
            edge.seek(used_edge);
            if let Some(mode) = self.request.mode {
                if !edge.flag(mode.allows_flag()) {
                    continue;
                }
            }

            let mut state = State::origin(vertex, self.request.arrive_by);
            state.increment_weight(i64::from(distance_mm));
            state.increment_time_ms(self.request.travel_time_ms(distance_mm, &edge));
            self.install(state);
        }

        if self.queue.is_empty() {
            warn!(
                "No endpoint of edge {} is usable from the split point",
                split.edge
            );
        }
    }

    /// Runs the search until the target is reached or the queue is exhausted.
    ///
    /// Queued labels are re-prioritized first, so the target may be set before
    /// or after the origin.
    pub fn route(&mut self) {
        if self.queue.is_empty() {
            warn!("Routing without first setting an origin, no search will happen");
        }
        self.reprioritize();

        let layer = self.layer;
        let target = self.target.map(|(vertex, _)| vertex);
        let mut edge = layer.edge_cursor();

        while let Some(QueueEntry { state: s0_id, .. }) = self.queue.pop() {
            let s0 = self.states[s0_id.0];

            // Superseded after being queued
            if self.best_states.get(&s0.vertex) != Some(&s0_id) {
                continue;
            }

            if target == Some(s0.vertex) {
                debug!(
                    "Found target vertex {} at weight {} mm",
                    s0.vertex, s0.weight
                );
                self.last_state = Some(s0_id);
                break;
            }

            let edges = if self.request.arrive_by {
                layer.incoming_edges(s0.vertex)
            } else {
                layer.outgoing_edges(s0.vertex)
            };
            for &edge_index in edges {
                edge.seek(edge_index);
                let Some(s1) = edge.traverse(s0_id, &s0, &self.request) else {
                    continue;
                };
                if target.is_none() && s1.weight > self.distance_limit_mm {
                    continue;
                }

                let improves = match self.best_states.get(&s1.vertex) {
                    None => true,
                    Some(best) => s1.weight < self.states[best.0].weight,
                };
                if improves {
                    self.install(s1);
                }
            }
        }

        debug!(
            "Search finished with {} reached vertices and {} labels",
            self.best_states.len(),
            self.states.len()
        );
    }

    /// Label at the target, if the last search reached it
    pub fn last_state(&self) -> Option<StateId> {
        self.last_state
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn best_state(&self, vertex: VertexIndex) -> Option<StateId> {
        self.best_states.get(&vertex).copied()
    }

    /// Weight of the best label at `vertex`; `None` when unreachable
    pub fn weight_to_vertex(&self, vertex: VertexIndex) -> Option<Weight> {
        self.best_state(vertex).map(|id| self.states[id.0].weight)
    }

    /// Absolute travel time to `vertex` in milliseconds; `None` when unreachable
    pub fn travel_time_to_vertex(&self, vertex: VertexIndex) -> Option<u64> {
        self.best_state(vertex)
            .map(|id| self.states[id.0].time_ms.unsigned_abs())
    }

    /// Every reached vertex with its weight, ordered by vertex index
    pub fn reachability_tree(&self) -> Vec<(VertexIndex, Weight)> {
        let mut tree: Vec<_> = self
            .best_states
            .iter()
            .map(|(&vertex, id)| (vertex, self.states[id.0].weight))
            .collect();
        tree.sort_unstable_by_key(|&(vertex, _)| vertex);
        tree
    }

    /// Edges on the path to the target in search order; empty when not found
    pub fn visited_edges(&self) -> Vec<EdgeIndex> {
        let Some(mut current) = self.last_state else {
            debug!("No target reached, no visited edges");
            return Vec::new();
        };
        let mut edges = Vec::new();
        loop {
            let state = &self.states[current.0];
            match (state.back_edge, state.back_state) {
                (Some(edge), Some(back)) => {
                    edges.push(edge);
                    current = back;
                }
                _ => break,
            }
        }
        edges.reverse();
        edges
    }

    pub(crate) fn states(&self) -> &[State] {
        &self.states
    }

    fn reset(&mut self) {
        self.states.clear();
        self.best_states.clear();
        self.queue.clear();
        self.last_state = None;
    }

    /// Stores `state` as the best label of its vertex and queues it.
    fn install(&mut self, state: State) -> StateId {
        let id = StateId(self.states.len());
        let priority = state.weight + self.heuristic(state.vertex);
        self.states.push(state);
        self.best_states.insert(state.vertex, id);
        self.queue.push(QueueEntry { priority, state: id });
        id
    }

    /// Recomputes queue priorities against the current target.
    fn reprioritize(&mut self) {
        let pending: Vec<StateId> = self.queue.drain().map(|entry| entry.state).collect();
        for id in pending {
            let state = self.states[id.0];
            let priority = state.weight + self.heuristic(state.vertex);
            self.queue.push(QueueEntry { priority, state: id });
        }
    }

    /// Straight-line distance to the target in millimeters, zero without a target.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn heuristic(&self, vertex: VertexIndex) -> Weight {
        match self.target {
            Some((_, target)) => {
                let meters = Haversine.distance(self.layer.vertex(vertex).point(), target);
                (meters * 1000.0) as Weight
            }
            None => 0,
        }
    }
}
