//! Projection of arbitrary points onto street edges

use geo::Point;

use super::edge_store::Edge;
use super::vertex_store::{FIXED_FACTOR, fixed_to_floating};
use crate::{EdgeIndex, VertexIndex};

/// Meters per degree of latitude on a sphere of mean Earth radius
pub(crate) const METERS_PER_DEGREE: f64 = 111_194.93;

/// Meters covered by one fixed-point unit of latitude
const METERS_PER_FIXED_UNIT: f64 = METERS_PER_DEGREE / FIXED_FACTOR;

/// Location of a point snapped onto an edge pair
///
/// `vertex0` is the from vertex of the pair's forward edge and `vertex1` its to
/// vertex. The two distances are measured along the edge from those vertices to
/// the projected point and always add up to the edge length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    /// Forward edge of the split pair
    pub edge: EdgeIndex,
    /// Geometry segment containing the projected point
    pub segment: usize,
    pub fixed_lat: i32,
    pub fixed_lon: i32,
    pub vertex0: VertexIndex,
    pub vertex1: VertexIndex,
    pub distance0_mm: u32,
    pub distance1_mm: u32,
    /// Distance between the query point and the projected point
    pub distance_to_edge_mm: u32,
}

impl Split {
    /// Projects a fixed-point location onto the closest segment of `edge`.
    ///
    /// Uses an equirectangular approximation around the query point, which is
    /// accurate at snapping distances.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::similar_names
    )]
    pub(crate) fn project(edge: &Edge<'_>, fixed_lat: i32, fixed_lon: i32) -> Self {
        let cos_lat = fixed_to_floating(fixed_lat).to_radians().cos();
        let px = f64::from(fixed_lon) * cos_lat;
        let py = f64::from(fixed_lat);

        let mut best_dist_sq = f64::INFINITY;
        let mut best_segment = 0;
        let mut best_t = 0.0;
        let mut best_point = (fixed_lat, fixed_lon);
        let mut along_before_best = 0.0;
        let mut best_segment_len = 0.0;
        let mut total_len = 0.0;

        edge.for_each_segment(|index, lat0, lon0, lat1, lon1| {
            let x0 = f64::from(lon0) * cos_lat;
            let y0 = f64::from(lat0);
            let dx = f64::from(lon1) * cos_lat - x0;
            let dy = f64::from(lat1) - y0;
            let len_sq = dx * dx + dy * dy;

            let t = if len_sq > 0.0 {
                (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let cx = x0 + t * dx;
            let cy = y0 + t * dy;
            let dist_sq = (px - cx).powi(2) + (py - cy).powi(2);

            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best_segment = index;
                best_t = t;
                best_point = (
                    (f64::from(lat0) + t * f64::from(lat1 - lat0)).round() as i32,
                    (f64::from(lon0) + t * f64::from(lon1 - lon0)).round() as i32,
                );
                along_before_best = total_len;
                best_segment_len = len_sq.sqrt();
            }
            total_len += len_sq.sqrt();
        });

        let along = along_before_best + best_t * best_segment_len;
        let fraction = if total_len > 0.0 {
            (along / total_len).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let length_mm = edge.length_mm();
        let distance0_mm = (fraction * f64::from(length_mm)).round() as u32;
        let distance0_mm = distance0_mm.min(length_mm);
        let distance_to_edge_mm = (best_dist_sq.sqrt() * METERS_PER_FIXED_UNIT * 1000.0)
            .round()
            .min(f64::from(u32::MAX)) as u32;

        let forward_edge = edge.pair_index() * 2;
        let (vertex0, vertex1) = if edge.is_forward() {
            (edge.from_vertex(), edge.to_vertex())
        } else {
            (edge.to_vertex(), edge.from_vertex())
        };

        Self {
            edge: forward_edge,
            segment: best_segment,
            fixed_lat: best_point.0,
            fixed_lon: best_point.1,
            vertex0,
            vertex1,
            distance0_mm,
            distance1_mm: length_mm - distance0_mm,
            distance_to_edge_mm,
        }
    }

    pub fn lat(&self) -> f64 {
        fixed_to_floating(self.fixed_lat)
    }

    pub fn lon(&self) -> f64 {
        fixed_to_floating(self.fixed_lon)
    }

    /// Projected point (x = lon, y = lat)
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon(), self.lat())
    }

    pub fn distance_to_edge_m(&self) -> f64 {
        f64::from(self.distance_to_edge_mm) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::streets::edge_store::EdgeStore;
    use crate::model::streets::flags::EdgeFlags;
    use crate::model::streets::vertex_store::{VertexStore, floating_to_fixed};

    fn straight_edge() -> (VertexStore, EdgeStore) {
        let mut vertices = VertexStore::default();
        vertices.add_vertex(0.0, 0.0, 1, None);
        vertices.add_vertex(0.0, 0.01, 2, None);
        let mut edges = EdgeStore::default();
        let all = EdgeFlags::ALLOWS_ALL;
        edges.add_edge_pair(0, 1, 1_111_949, 3, None, 0, 0, all, all);
        (vertices, edges)
    }

    #[test]
    fn midpoint_splits_length_in_half() {
        let (vertices, edges) = straight_edge();
        let edge = edges.cursor_at(&vertices, 0);
        let split = Split::project(&edge, floating_to_fixed(0.0001), floating_to_fixed(0.005));

        assert_eq!(split.edge, 0);
        assert_eq!((split.vertex0, split.vertex1), (0, 1));
        assert_eq!(split.distance0_mm + split.distance1_mm, 1_111_949);
        assert!(split.distance0_mm.abs_diff(split.distance1_mm) <= 2);
        assert_eq!(split.fixed_lat, 0);
        assert_eq!(split.fixed_lon, floating_to_fixed(0.005));
        // 0.0001 degrees of latitude is roughly 11 m
        assert!((split.distance_to_edge_m() - 11.12).abs() < 0.05);
    }

    #[test]
    fn backward_cursor_reports_forward_pair() {
        let (vertices, edges) = straight_edge();
        let edge = edges.cursor_at(&vertices, 1);
        let split = Split::project(&edge, 0, floating_to_fixed(0.002));

        assert_eq!(split.edge, 0);
        assert_eq!((split.vertex0, split.vertex1), (0, 1));
        assert!(split.distance0_mm < split.distance1_mm);
    }

    #[test]
    fn points_beyond_the_end_clamp_to_the_vertex() {
        let (vertices, edges) = straight_edge();
        let edge = edges.cursor_at(&vertices, 0);
        let split = Split::project(&edge, 0, floating_to_fixed(0.02));

        assert_eq!(split.distance1_mm, 0);
        assert_eq!(split.fixed_lon, floating_to_fixed(0.01));
    }

    #[test]
    fn picks_closest_segment_of_bent_edge() {
        let mut vertices = VertexStore::default();
        vertices.add_vertex(0.0, 0.0, 1, None);
        vertices.add_vertex(0.01, 0.01, 2, None);
        let mut edges = EdgeStore::default();
        let none = EdgeFlags::NONE;
        edges.add_edge_pair(0, 1, 2_000_000, 3, None, 0, 0, none, none);
        let corner = floating_to_fixed(0.01);
        edges
            .cursor_mut(0)
            .set_geometry(&[(0, 0), (0, corner), (corner, corner)]);

        let edge = edges.cursor_at(&vertices, 0);
        let split = Split::project(&edge, floating_to_fixed(0.005), floating_to_fixed(0.011));

        assert_eq!(split.segment, 1);
        assert_eq!(split.fixed_lon, floating_to_fixed(0.01));
        // Three quarters of the way along two equal legs
        assert!(split.distance0_mm.abs_diff(1_500_000) < 5_000);
    }
}
