use std::cmp::Ordering;

use log::warn;

use crate::{EdgeIndex, VertexIndex, Weight};

/// Handle of a label stored in a router's state arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Search label: a vertex reached with some weight, and how it was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub vertex: VertexIndex,
    /// Distance travelled so far, in millimeters
    pub weight: Weight,
    /// Milliseconds relative to the search start; negative on arrive-by searches
    pub time_ms: i64,
    pub back_edge: Option<EdgeIndex>,
    pub back_state: Option<StateId>,
    /// Reserved for co-dominant labels at the same vertex; never set by the search
    pub next_state: Option<StateId>,
    /// Whether time runs backwards (arrive-by search)
    pub traversing_backward: bool,
}

impl State {
    /// Origin label with no predecessor
    pub fn origin(vertex: VertexIndex, traversing_backward: bool) -> Self {
        Self {
            vertex,
            weight: 0,
            time_ms: 0,
            back_edge: None,
            back_state: None,
            next_state: None,
            traversing_backward,
        }
    }

    /// Label at `vertex` reached from this one over `back_edge`.
    pub(crate) fn successor(
        &self,
        back_state: StateId,
        vertex: VertexIndex,
        back_edge: EdgeIndex,
    ) -> Self {
        Self {
            vertex,
            back_edge: Some(back_edge),
            back_state: Some(back_state),
            next_state: None,
            ..*self
        }
    }

    pub fn is_origin(&self) -> bool {
        self.back_state.is_none()
    }

    /// Adds to the weight. Negative increments are a cost-function defect and are
    /// ignored.
    pub fn increment_weight(&mut self, delta: i64) {
        match Weight::try_from(delta) {
            Ok(delta) => self.weight = self.weight.saturating_add(delta),
            Err(_) => warn!(
                "Ignoring negative weight increment {delta} at vertex {}",
                self.vertex
            ),
        }
    }

    /// Moves time by `delta_ms`, backwards when traversing backward. Negative
    /// increments are a cost-function defect and are ignored.
    pub fn increment_time_ms(&mut self, delta_ms: i64) {
        if delta_ms < 0 {
            warn!(
                "Ignoring negative time increment {delta_ms} ms at vertex {}",
                self.vertex
            );
            return;
        }
        if self.traversing_backward {
            self.time_ms -= delta_ms;
        } else {
            self.time_ms += delta_ms;
        }
    }
}

/// Priority queue entry. Ordering is reversed so `BinaryHeap` pops the minimum.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct QueueEntry {
    pub(crate) priority: Weight,
    pub(crate) state: StateId,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by priority, earlier labels first on ties
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.state.cmp(&self.state))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
