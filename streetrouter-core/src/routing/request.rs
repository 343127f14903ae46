use serde::{Deserialize, Serialize};

use crate::model::streets::edge_store::{DEFAULT_SPEED_KPH, Edge};
use crate::model::TransportMode;

pub const DEFAULT_WALK_SPEED_MPS: f64 = 1.33;
pub const DEFAULT_BIKE_SPEED_MPS: f64 = 5.0;

/// Parameters of a single street search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingRequest {
    /// Search backwards from the destination over incoming edges
    pub arrive_by: bool,
    /// Restricts traversal to edges allowing this mode; `None` allows every edge
    pub mode: Option<TransportMode>,
    pub walk_speed_mps: f64,
    pub bike_speed_mps: f64,
}

impl Default for RoutingRequest {
    fn default() -> Self {
        Self {
            arrive_by: false,
            mode: None,
            walk_speed_mps: DEFAULT_WALK_SPEED_MPS,
            bike_speed_mps: DEFAULT_BIKE_SPEED_MPS,
        }
    }
}

impl RoutingRequest {
    pub fn new(mode: Option<TransportMode>) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn arrive_by(mut self, arrive_by: bool) -> Self {
        self.arrive_by = arrive_by;
        self
    }

    /// Travel speed on `edge` in m/s for the requested mode.
    ///
    /// Cars use the edge speed column, falling back to a default for edges
    /// without one. Walking is assumed when no mode is set.
    pub fn speed_mps(&self, edge: &Edge<'_>) -> f64 {
        let speed = match self.mode {
            Some(TransportMode::Car) => edge.speed_mps(),
            Some(TransportMode::Bicycle) => self.bike_speed_mps,
            Some(TransportMode::Foot) | None => self.walk_speed_mps,
        };
        if speed > 0.0 {
            speed
        } else if self.mode == Some(TransportMode::Car) {
            DEFAULT_SPEED_KPH / 3.6
        } else {
            DEFAULT_WALK_SPEED_MPS
        }
    }

    /// Milliseconds needed to cover `length_mm` along `edge`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn travel_time_ms(&self, length_mm: u32, edge: &Edge<'_>) -> i64 {
        (f64::from(length_mm) / self.speed_mps(edge)).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::streets::edge_store::speed_from_kph;
    use crate::model::{EdgeFlags, EdgeStore, VertexStore};

    #[test]
    fn speed_depends_on_mode() {
        let mut vertices = VertexStore::default();
        vertices.add_vertex(0.0, 0.0, 1, None);
        vertices.add_vertex(0.0, 0.01, 2, None);
        let mut edges = EdgeStore::default();
        let all = EdgeFlags::ALLOWS_ALL;
        edges.add_edge_pair(0, 1, 1_000_000, 3, None, speed_from_kph(36.0), 0, all, all);

        let forward = edges.cursor_at(&vertices, 0);
        let backward = edges.cursor_at(&vertices, 1);

        let car = RoutingRequest::new(Some(TransportMode::Car));
        assert!((car.speed_mps(&forward) - 10.0).abs() < 1e-9);
        assert_eq!(car.travel_time_ms(1_000_000, &forward), 100_000);
        // No speed stored on the backward edge
        assert!((car.speed_mps(&backward) - 50.0 / 3.6).abs() < 1e-9);

        let walk = RoutingRequest::default();
        assert!((walk.speed_mps(&forward) - 1.33).abs() < 1e-9);
        let bike = RoutingRequest::new(Some(TransportMode::Bicycle));
        assert_eq!(bike.travel_time_ms(1_000_000, &forward), 200_000);
    }
}
