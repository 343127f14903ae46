use super::state::{State, StateId};
use super::street_router::StreetRouter;
use crate::model::StreetLayer;
use crate::{EdgeIndex, Error, VertexIndex, Weight};

/// Route reconstructed from a terminal label, in travel order
///
/// For arrive-by searches the label chain runs from the destination back to the
/// start, so it is reversed before the edge and vertex sequences are read.
#[derive(Debug, Clone)]
pub struct StreetPath {
    /// Labels from start to end; `back_state` ids index into this list
    states: Vec<State>,
    edges: Vec<EdgeIndex>,
    vertices: Vec<VertexIndex>,
    weight: Weight,
    duration_ms: u64,
}

impl StreetPath {
    /// Fails with `Error::PathNotFound` when there is no terminal label.
    pub fn new(
        router: &StreetRouter<'_>,
        terminal: Option<StateId>,
        arrive_by: bool,
    ) -> Result<Self, Error> {
        let terminal = terminal.ok_or(Error::PathNotFound)?;

        // Terminal first, search origin last
        let mut chain = Vec::new();
        let mut current = Some(terminal);
        while let Some(id) = current {
            let state = *router.state(id);
            chain.push(state);
            current = state.back_state;
        }

        let last = router.state(terminal);
        let states = if arrive_by {
            reverse_chain(router.layer(), &chain)
        } else {
            chain.reverse();
            relink(chain)
        };

        let edges = states.iter().filter_map(|s| s.back_edge).collect();
        let vertices = states.iter().map(|s| s.vertex).collect();

        Ok(Self {
            states,
            edges,
            vertices,
            weight: last.weight,
            duration_ms: last.time_ms.unsigned_abs(),
        })
    }

    /// Path that stays at `vertex` without traversing any edge
    pub fn at_vertex(vertex: VertexIndex) -> Self {
        Self {
            states: vec![State::origin(vertex, false)],
            edges: Vec::new(),
            vertices: vec![vertex],
            weight: 0,
            duration_ms: 0,
        }
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Traversed edges in travel order
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    /// Visited vertices in travel order, one more than edges
    pub fn vertices(&self) -> &[VertexIndex] {
        &self.vertices
    }

    /// Total weight in millimeters, including split offsets
    pub fn weight(&self) -> Weight {
        self.weight
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn distance_m(&self) -> f64 {
        self.weight as f64 / 1000.0
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn start_vertex(&self) -> VertexIndex {
        self.vertices[0]
    }

    pub fn end_vertex(&self) -> VertexIndex {
        self.vertices[self.vertices.len() - 1]
    }
}

/// Points every `back_state` at the previous entry of the list.
fn relink(mut states: Vec<State>) -> Vec<State> {
    for (index, state) in states.iter_mut().enumerate() {
        state.back_state = index.checked_sub(1).map(StateId);
        if index == 0 {
            state.back_edge = None;
        }
    }
    states
}

/// Turns a backward label chain (terminal first) into forward travel order.
///
/// Each vertex is recovered from the other endpoint of the edge actually
/// traversed, and weight and time deltas are re-applied in travel order.
fn reverse_chain(layer: &StreetLayer, chain: &[State]) -> Vec<State> {
    let Some(first) = chain.first() else {
        return Vec::new();
    };

    let mut ret = State {
        weight: 0,
        back_edge: None,
        back_state: None,
        next_state: None,
        traversing_backward: false,
        ..*first
    };
    let mut reversed = Vec::with_capacity(chain.len());

    for pair in chain.windows(2) {
        let (orig, back) = (&pair[0], &pair[1]);
        let Some(edge_index) = orig.back_edge else {
            break;
        };
        let edge = layer.edge(edge_index);

        let mut child = ret;
        child.back_state = Some(StateId(reversed.len()));
        child.back_edge = Some(edge_index);
        child.vertex = if edge.from_vertex() == edge.to_vertex() {
            // Self-loop: both endpoints are the same vertex
            edge.to_vertex()
        } else if edge.from_vertex() == ret.vertex {
            edge.to_vertex()
        } else {
            edge.from_vertex()
        };
        #[allow(clippy::cast_possible_wrap)]
        child.increment_weight(orig.weight as i64 - back.weight as i64);
        child.increment_time_ms((orig.time_ms - back.time_ms).abs());

        reversed.push(ret);
        ret = child;
    }
    reversed.push(ret);
    reversed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeFlags, TransportMode};
    use crate::routing::RoutingRequest;

    /// A - B - C with a one-way shortcut C -> A
    fn triangle() -> StreetLayer {
        let mut layer = StreetLayer::default();
        for (i, (lat, lon)) in [(0.0, 0.0), (0.0, 0.001), (0.001, 0.001)].into_iter().enumerate() {
            layer.add_vertex(lat, lon, i as i64 + 1, None);
        }
        let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
        layer
            .add_edge_pair(0, 1, 120_000, 10, None, 0, 0, walk, walk)
            .unwrap();
        layer
            .add_edge_pair(1, 2, 130_000, 11, None, 0, 0, walk, walk)
            .unwrap();
        layer
            .add_edge_pair(2, 0, 160_000, 12, None, 0, 0, walk, EdgeFlags::NONE)
            .unwrap();
        layer
    }

    #[test]
    fn missing_terminal_is_path_not_found() {
        let layer = triangle();
        let router = StreetRouter::new(&layer, RoutingRequest::default());
        let result = StreetPath::new(&router, None, false);
        assert!(matches!(result, Err(Error::PathNotFound)));
    }

    #[test]
    fn path_at_vertex_has_no_edges() {
        let path = StreetPath::at_vertex(1);
        assert_eq!(path.vertices(), &[1]);
        assert!(path.edges().is_empty());
        assert_eq!(path.start_vertex(), path.end_vertex());
        assert_eq!(path.weight(), 0);
        assert_eq!(path.duration_ms(), 0);
    }

    #[test]
    fn depart_at_path_in_travel_order() {
        let layer = triangle();
        let request = RoutingRequest::new(Some(TransportMode::Foot));
        let mut router = StreetRouter::new(&layer, request);
        router.set_origin_vertex(0);
        router.set_target_vertex(2);
        router.route();

        let path = StreetPath::new(&router, router.last_state(), false).unwrap();
        assert_eq!(path.vertices(), &[0, 1, 2]);
        assert_eq!(path.edges(), &[0, 2]);
        assert_eq!(path.weight(), 250_000);
        assert_eq!(path.states()[2].back_state, Some(StateId(1)));
        assert!(path.duration_ms() > 0);
    }

    #[test]
    fn arrive_by_path_is_reversed_into_travel_order() {
        let layer = triangle();
        let request = RoutingRequest::new(Some(TransportMode::Foot)).arrive_by(true);
        let mut router = StreetRouter::new(&layer, request);
        // Searching back from A, trip starts at C
        router.set_origin_vertex(0);
        router.set_target_vertex(2);
        router.route();

        let path = StreetPath::new(&router, router.last_state(), true).unwrap();
        assert_eq!(path.vertices(), &[2, 0]);
        assert_eq!(path.edges(), &[4]);
        assert_eq!(path.weight(), 160_000);

        let states = path.states();
        assert_eq!(states[0].weight, 0);
        assert_eq!(states[1].weight, 160_000);
        assert!(states[1].time_ms > states[0].time_ms);
        assert_eq!(states[1].time_ms, 0);
    }

    #[test]
    fn reversal_handles_self_loops() {
        let mut layer = triangle();
        let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
        layer
            .add_edge_pair(1, 1, 5_000, 13, None, 0, 0, walk, walk)
            .unwrap();

        // Backward chain A <- B <- (loop) B <- C, terminal first
        let origin = State::origin(2, true);
        let at_b = State {
            vertex: 1,
            weight: 130_000,
            time_ms: -100,
            back_edge: Some(2),
            back_state: Some(StateId(0)),
            ..origin
        };
        let looped = State {
            weight: 135_000,
            time_ms: -110,
            back_edge: Some(6),
            back_state: Some(StateId(1)),
            ..at_b
        };
        let at_a = State {
            vertex: 0,
            weight: 255_000,
            time_ms: -200,
            back_edge: Some(0),
            back_state: Some(StateId(2)),
            ..at_b
        };

        let reversed = reverse_chain(&layer, &[at_a, looped, at_b, origin]);
        let vertices: Vec<_> = reversed.iter().map(|s| s.vertex).collect();
        assert_eq!(vertices, vec![0, 1, 1, 2]);
        let weights: Vec<_> = reversed.iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![0, 120_000, 125_000, 255_000]);
        assert_eq!(reversed[3].time_ms, 0);
        assert_eq!(reversed[3].back_state, Some(StateId(2)));
    }
}
