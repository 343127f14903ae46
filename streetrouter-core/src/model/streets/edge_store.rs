//! Column store of street edges
//!
//! Edges come in pairs with the same endpoints and geometry, traversed in opposite
//! directions. Even edge indices are forward, odd indices are backward, and
//! `edge_index / 2` is the pair index used for every column shared by both
//! directions (endpoints, length, geometry, source id). Flags and speeds are kept
//! per direction.
//!
//! Only intermediate points are stored as geometry; the two endpoint vertices are
//! resolved from the `VertexStore` when a full geometry is needed. Straight edges
//! keep an empty boxed slice, which does not allocate.

use std::fmt;

use geo::{Coord, LineString, Rect};
use itertools::Itertools;
use log::{info, warn};

use super::flags::{EdgeFlags, TraversalPermission};
use super::names::NameTable;
use super::vertex_store::{VertexStore, fixed_to_floating};
use crate::routing::{RoutingRequest, State, StateId};
use crate::{EdgeIndex, Error, SourceId, VertexIndex};

/// Name stored for ways that have none
pub const EMPTY_NAME: &str = "NO_NAME";

/// Speed used when an edge carries no usable speed value
pub const DEFAULT_SPEED_KPH: f64 = 50.0;

/// Converts km/h to the stored speed unit (centimeters per second).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn speed_from_kph(kph: f64) -> u16 {
    (kph / 3.6 * 100.0).round().clamp(0.0, f64::from(u16::MAX)) as u16
}

#[derive(Debug, Clone, Default)]
pub struct EdgeStore {
    /// One entry per edge
    flags: Vec<EdgeFlags>,
    /// One entry per edge, centimeters per second
    speeds: Vec<u16>,
    /// One entry per pair
    from_vertices: Vec<u32>,
    /// One entry per pair
    to_vertices: Vec<u32>,
    /// One entry per pair
    lengths_mm: Vec<u32>,
    /// One entry per pair
    source_ids: Vec<SourceId>,
    /// Packed fixed-point `lat, lon` pairs of intermediate points, one entry per pair
    geometries: Vec<Box<[i32]>>,
    names: NameTable,
}

impl EdgeStore {
    pub fn with_capacity(edges: usize) -> Self {
        let pairs = edges / 2;
        Self {
            flags: Vec::with_capacity(edges),
            speeds: Vec::with_capacity(edges),
            from_vertices: Vec::with_capacity(pairs),
            to_vertices: Vec::with_capacity(pairs),
            lengths_mm: Vec::with_capacity(pairs),
            source_ids: Vec::with_capacity(pairs),
            geometries: Vec::with_capacity(pairs),
            names: NameTable::with_capacity(pairs),
        }
    }

    /// Creates a bare edge pair and returns the index of its forward edge.
    ///
    /// The backward edge is always `forward + 1`. Geometry and extra flags can be
    /// set afterwards through a mutable cursor.
    #[allow(clippy::too_many_arguments)]
    pub fn add_edge_pair(
        &mut self,
        from_vertex: VertexIndex,
        to_vertex: VertexIndex,
        length_mm: u32,
        source_id: SourceId,
        name: Option<&str>,
        forward_speed: u16,
        backward_speed: u16,
        forward_flags: EdgeFlags,
        backward_flags: EdgeFlags,
    ) -> EdgeIndex {
        let forward_edge = self.flags.len();

        self.lengths_mm.push(length_mm);
        self.from_vertices.push(to_u32(from_vertex));
        self.to_vertices.push(to_u32(to_vertex));
        self.geometries.push(Box::default());
        self.source_ids.push(source_id);
        self.names.insert(source_id, name.unwrap_or(EMPTY_NAME));

        // Forward edge
        self.speeds.push(forward_speed);
        self.flags.push(forward_flags);
        // Backward edge
        self.speeds.push(backward_speed);
        self.flags.push(backward_flags);

        forward_edge
    }

    /// Number of directed edges (always even)
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.lengths_mm.len()
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// Cursor positioned before the first edge, to be moved with `advance`.
    pub fn cursor<'a>(&'a self, vertices: &'a VertexStore) -> Edge<'a> {
        Edge {
            store: self,
            vertices,
            edge_index: usize::MAX,
            pair_index: usize::MAX,
            backward: true,
        }
    }

    /// Cursor positioned at `edge_index`.
    pub fn cursor_at<'a>(&'a self, vertices: &'a VertexStore, edge_index: EdgeIndex) -> Edge<'a> {
        let mut edge = self.cursor(vertices);
        edge.seek(edge_index);
        edge
    }

    /// Writing cursor positioned at `edge_index`.
    pub fn cursor_mut(&mut self, edge_index: EdgeIndex) -> EdgeMut<'_> {
        EdgeMut {
            store: self,
            edge_index,
            pair_index: edge_index / 2,
            backward: edge_index % 2 == 1,
        }
    }

    /// Removes the pairs containing the given edges.
    ///
    /// Input may be in any order and may contain both edges of a pair or
    /// duplicates. Indices past the end are a programming error and panic.
    pub fn remove(&mut self, edges: &[EdgeIndex]) {
        let pair_count = self.pair_count();
        let pairs: Vec<usize> = edges
            .iter()
            .map(|&edge| {
                assert!(
                    edge < self.len(),
                    "edge index {edge} out of range ({} edges)",
                    self.len()
                );
                edge / 2
            })
            .sorted_unstable_by(|a, b| b.cmp(a))
            .dedup()
            .collect();

        // Sorted, deduplicated and bounded above, so this cannot be rejected.
        if let Err(e) = self.remove_pairs_descending(&pairs) {
            unreachable!("{e} for {} pairs in a store of {pair_count}", pairs.len());
        }
    }

    /// Removes edge pairs given in strictly descending pair-index order.
    ///
    /// Removing a pair shifts every later pair down by one, so processing the
    /// highest index first keeps the remaining indices valid. Input that is not
    /// strictly descending is rejected without modifying the store.
    pub fn remove_pairs_descending(&mut self, pairs: &[usize]) -> Result<(), Error> {
        if let Some((a, b)) = pairs.iter().tuple_windows().find(|(a, b)| a <= b) {
            return Err(Error::InvalidRemoval(format!(
                "pair indices must be strictly descending, found {a} before {b}"
            )));
        }
        if let Some(&first) = pairs.first() {
            if first >= self.pair_count() {
                return Err(Error::InvalidRemoval(format!(
                    "pair index {first} out of range ({} pairs)",
                    self.pair_count()
                )));
            }
        }

        for &pair in pairs {
            // Flags and speeds hold both directions of the pair.
            self.flags.drain(pair * 2..pair * 2 + 2);
            self.speeds.drain(pair * 2..pair * 2 + 2);

            self.from_vertices.remove(pair);
            self.to_vertices.remove(pair);
            self.lengths_mm.remove(pair);
            self.source_ids.remove(pair);
            self.geometries.remove(pair);
        }

        self.collect_unused_names();
        Ok(())
    }

    /// Drops name entries whose source id no longer appears on any edge.
    fn collect_unused_names(&mut self) {
        let used: hashbrown::HashSet<SourceId> = self.source_ids.iter().copied().collect();
        self.names.retain(|source_id| used.contains(&source_id));

        let unnamed = self.names.values().filter(|name| *name == EMPTY_NAME).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = if self.names.is_empty() {
            0.0
        } else {
            unnamed as f64 / self.names.len() as f64 * 100.0
        };
        info!(
            "Names: {} no name: {unnamed} ratio: {ratio:.1}%",
            self.names.len()
        );
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_u32(index: usize) -> u32 {
    debug_assert!(u32::try_from(index).is_ok(), "index {index} exceeds u32");
    index as u32
}

/// Read cursor over the edge store
///
/// Reading a position past the end of the store panics.
#[derive(Clone, Copy)]
pub struct Edge<'a> {
    store: &'a EdgeStore,
    vertices: &'a VertexStore,
    edge_index: EdgeIndex,
    pair_index: usize,
    backward: bool,
}

impl<'a> Edge<'a> {
    /// Moves to the next edge, returning `false` once past the end.
    pub fn advance(&mut self) -> bool {
        self.edge_index = self.edge_index.wrapping_add(1);
        self.pair_index = self.edge_index / 2;
        self.backward = !self.backward;
        self.edge_index < self.store.len()
    }

    pub fn seek(&mut self, edge_index: EdgeIndex) {
        self.edge_index = edge_index;
        self.pair_index = edge_index / 2;
        self.backward = edge_index % 2 == 1;
    }

    pub fn index(&self) -> EdgeIndex {
        self.edge_index
    }

    pub fn pair_index(&self) -> usize {
        self.pair_index
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    pub fn is_forward(&self) -> bool {
        !self.backward
    }

    pub fn from_vertex(&self) -> VertexIndex {
        let vertices = if self.backward {
            &self.store.to_vertices
        } else {
            &self.store.from_vertices
        };
        vertices[self.pair_index] as VertexIndex
    }

    pub fn to_vertex(&self) -> VertexIndex {
        let vertices = if self.backward {
            &self.store.from_vertices
        } else {
            &self.store.to_vertices
        };
        vertices[self.pair_index] as VertexIndex
    }

    pub fn flags(&self) -> EdgeFlags {
        self.store.flags[self.edge_index]
    }

    pub fn flag(&self, flag: EdgeFlags) -> bool {
        self.flags().contains(flag)
    }

    /// Raw speed in centimeters per second
    pub fn speed(&self) -> u16 {
        self.store.speeds[self.edge_index]
    }

    pub fn speed_mps(&self) -> f64 {
        f64::from(self.speed()) / 100.0
    }

    pub fn speed_kph(&self) -> f64 {
        self.speed_mps() * 3.6
    }

    pub fn length_mm(&self) -> u32 {
        self.store.lengths_mm[self.pair_index]
    }

    pub fn length_m(&self) -> f64 {
        f64::from(self.length_mm()) / 1000.0
    }

    pub fn source_id(&self) -> SourceId {
        self.store.source_ids[self.pair_index]
    }

    pub fn name(&self) -> &'a str {
        self.store.names.get(self.source_id()).unwrap_or(EMPTY_NAME)
    }

    pub fn has_bogus_name(&self) -> bool {
        self.name() == EMPTY_NAME
    }

    pub fn permissions(&self) -> TraversalPermission {
        self.flags().permissions()
    }

    /// Intermediate points of the pair in forward order (packed `lat, lon`)
    pub fn intermediate_points(&self) -> &'a [i32] {
        &self.store.geometries[self.pair_index]
    }

    /// Number of straight segments making up the geometry
    pub fn n_segments(&self) -> usize {
        self.intermediate_points().len() / 2 + 1
    }

    /// Computes the label reached by traversing this edge from `s0`.
    ///
    /// Returns `None` when the request's mode may not use this edge. On arrive-by
    /// requests the search walks incoming edges, so the label moves to the edge's
    /// from vertex and time runs backwards.
    pub fn traverse(&self, s0_id: StateId, s0: &State, request: &RoutingRequest) -> Option<State> {
        if let Some(mode) = request.mode {
            if !self.flag(mode.allows_flag()) {
                return None;
            }
        }

        let next_vertex = if request.arrive_by {
            self.from_vertex()
        } else {
            self.to_vertex()
        };
        let mut s1 = s0.successor(s0_id, next_vertex, self.edge_index);
        s1.increment_weight(i64::from(self.length_mm()));
        s1.increment_time_ms(request.travel_time_ms(self.length_mm(), self));
        Some(s1)
    }

    /// Full geometry in traversal direction, endpoints included (x = lon, y = lat)
    pub fn geometry(&self) -> LineString<f64> {
        let mut coords = Vec::with_capacity(self.n_segments() + 1);
        self.for_each_point(|_, fixed_lat, fixed_lon| {
            coords.push(Coord {
                x: fixed_to_floating(fixed_lon),
                y: fixed_to_floating(fixed_lat),
            });
        });
        if self.backward {
            coords.reverse();
        }
        LineString::new(coords)
    }

    /// Calls `consumer(index, lat0, lon0, lat1, lon1)` for every segment of the
    /// geometry, in forward order regardless of the cursor's direction.
    pub fn for_each_segment(&self, mut consumer: impl FnMut(usize, i32, i32, i32, i32)) {
        let (mut prev_lat, mut prev_lon) = self
            .vertices
            .fixed_coords(self.store.from_vertices[self.pair_index] as VertexIndex);
        let mut index = 0;
        for (&lat, &lon) in self.intermediate_points().iter().tuples() {
            consumer(index, prev_lat, prev_lon, lat, lon);
            prev_lat = lat;
            prev_lon = lon;
            index += 1;
        }
        let (lat, lon) = self
            .vertices
            .fixed_coords(self.store.to_vertices[self.pair_index] as VertexIndex);
        consumer(index, prev_lat, prev_lon, lat, lon);
    }

    /// Calls `consumer(index, lat, lon)` for every point of the geometry including
    /// both endpoints, in forward order regardless of the cursor's direction.
    pub fn for_each_point(&self, mut consumer: impl FnMut(usize, i32, i32)) {
        let (lat, lon) = self
            .vertices
            .fixed_coords(self.store.from_vertices[self.pair_index] as VertexIndex);
        consumer(0, lat, lon);
        let mut index = 1;
        for (&lat, &lon) in self.intermediate_points().iter().tuples() {
            consumer(index, lat, lon);
            index += 1;
        }
        let (lat, lon) = self
            .vertices
            .fixed_coords(self.store.to_vertices[self.pair_index] as VertexIndex);
        consumer(index, lat, lon);
    }

    /// Bounding rectangle of the whole geometry (x = lon, y = lat)
    pub fn envelope(&self) -> Rect<f64> {
        let mut min = Coord {
            x: f64::INFINITY,
            y: f64::INFINITY,
        };
        let mut max = Coord {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        };
        self.for_each_point(|_, fixed_lat, fixed_lon| {
            let (x, y) = (fixed_to_floating(fixed_lon), fixed_to_floating(fixed_lat));
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
        });
        Rect::new(min, max)
    }
}

impl fmt::Display for Edge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_forward() { "F" } else { "B" };
        write!(
            f,
            "{direction} Edge (osm:{}|{}) from {} to {}. Length {:.3} meters, speed {:.1} kph.",
            self.source_id(),
            self.edge_index,
            self.from_vertex(),
            self.to_vertex(),
            self.length_m(),
            self.speed_kph()
        )?;
        for name in self.flags().names() {
            write!(f, " {name}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Edge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("edge_index", &self.edge_index)
            .field("backward", &self.backward)
            .finish_non_exhaustive()
    }
}

/// Write cursor over the edge store
#[derive(Debug)]
pub struct EdgeMut<'a> {
    store: &'a mut EdgeStore,
    edge_index: EdgeIndex,
    pair_index: usize,
    backward: bool,
}

impl EdgeMut<'_> {
    pub fn seek(&mut self, edge_index: EdgeIndex) {
        self.edge_index = edge_index;
        self.pair_index = edge_index / 2;
        self.backward = edge_index % 2 == 1;
    }

    pub fn index(&self) -> EdgeIndex {
        self.edge_index
    }

    /// Moves the end of this edge. Affects both edges of the pair.
    pub fn set_to_vertex(&mut self, to_vertex: VertexIndex) {
        let vertices = if self.backward {
            &mut self.store.from_vertices
        } else {
            &mut self.store.to_vertices
        };
        vertices[self.pair_index] = to_u32(to_vertex);
    }

    pub fn flags(&self) -> EdgeFlags {
        self.store.flags[self.edge_index]
    }

    pub fn set_flag(&mut self, flag: EdgeFlags) {
        self.store.flags[self.edge_index].insert(flag);
    }

    pub fn clear_flag(&mut self, flag: EdgeFlags) {
        self.store.flags[self.edge_index].remove(flag);
    }

    /// Overwrites all flags, used when copying flags onto split edges.
    pub fn set_flags(&mut self, flags: EdgeFlags) {
        self.store.flags[self.edge_index] = flags;
    }

    pub fn set_speed(&mut self, speed: u16) {
        self.store.speeds[self.edge_index] = speed;
    }

    /// Sets the length shared by both edges of the pair.
    pub fn set_length_mm(&mut self, length_mm: u32) {
        self.store.lengths_mm[self.pair_index] = length_mm;
    }

    /// Sets the pair geometry from a full point list in forward order, endpoints
    /// included, given as fixed-point `(lat, lon)`. Only intermediates are kept.
    pub fn set_geometry(&mut self, points: &[(i32, i32)]) {
        if points.len() <= 2 {
            self.store.geometries[self.pair_index] = Box::default();
            return;
        }
        if self.backward {
            warn!(
                "Setting a forward geometry on backward edge {}",
                self.edge_index
            );
        }
        self.set_intermediate_points(
            points[1..points.len() - 1]
                .iter()
                .flat_map(|&(lat, lon)| [lat, lon])
                .collect(),
        );
    }

    /// Sets packed `lat, lon` intermediate points directly.
    pub fn set_intermediate_points(&mut self, packed: Vec<i32>) {
        debug_assert!(packed.len() % 2 == 0, "odd number of packed coordinates");
        self.store.geometries[self.pair_index] = packed.into_boxed_slice();
    }
}
