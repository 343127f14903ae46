//! Street layer: the vertex and edge stores plus the indexes used for routing

use log::{debug, info};
use rstar::{AABB, RTree, RTreeObject};

use super::edge_store::{Edge, EdgeStore};
use super::flags::EdgeFlags;
use super::split::{METERS_PER_DEGREE, Split};
use super::vertex_store::{Vertex, VertexStore, floating_to_fixed};
use crate::{EdgeIndex, Error, SourceId, VertexIndex};

/// Bounding box of one edge pair in the spatial index
#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgePairEnvelope {
    pair_index: usize,
    bbox: AABB<[f64; 2]>,
}

impl RTreeObject for EdgePairEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bbox
    }
}

/// Street network ready for routing
///
/// Adding vertices and edge pairs through the layer keeps the adjacency lists and
/// the spatial index current. After editing the stores directly (through
/// `vertex_store_mut` or `edge_store_mut`) call `build_indexes`.
#[derive(Debug, Default)]
pub struct StreetLayer {
    vertices: VertexStore,
    edges: EdgeStore,
    /// Edges leaving each vertex
    outgoing: Vec<Vec<EdgeIndex>>,
    /// Edges entering each vertex
    incoming: Vec<Vec<EdgeIndex>>,
    spatial_index: RTree<EdgePairEnvelope>,
}

impl StreetLayer {
    pub fn new(vertices: VertexStore, edges: EdgeStore) -> Result<Self, Error> {
        let mut layer = Self {
            vertices,
            edges,
            ..Default::default()
        };
        layer.validate()?;
        layer.build_indexes();
        Ok(layer)
    }

    pub fn vertex_store(&self) -> &VertexStore {
        &self.vertices
    }

    pub fn edge_store(&self) -> &EdgeStore {
        &self.edges
    }

    pub fn vertex_store_mut(&mut self) -> &mut VertexStore {
        &mut self.vertices
    }

    pub fn edge_store_mut(&mut self) -> &mut EdgeStore {
        &mut self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, index: VertexIndex) -> Vertex<'_> {
        self.vertices.cursor_at(index)
    }

    pub fn edge(&self, index: EdgeIndex) -> Edge<'_> {
        self.edges.cursor_at(&self.vertices, index)
    }

    /// Cursor positioned before the first edge
    pub fn edge_cursor(&self) -> Edge<'_> {
        self.edges.cursor(&self.vertices)
    }

    pub fn add_vertex(
        &mut self,
        lat: f64,
        lon: f64,
        source_id: SourceId,
        name: Option<&str>,
    ) -> VertexIndex {
        let index = self.vertices.add_vertex(lat, lon, source_id, name);
        self.grow_adjacency(index);
        index
    }

    /// Adds an edge pair and indexes it. Returns the forward edge index.
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
    ) -> Result<EdgeIndex, Error> {
        for vertex in [from_vertex, to_vertex] {
            if vertex >= self.vertices.len() {
                return Err(Error::InvalidVertex(vertex));
            }
        }

        let forward_edge = self.edges.add_edge_pair(
            from_vertex,
            to_vertex,
            length_mm,
            source_id,
            name,
            forward_speed,
            backward_speed,
            forward_flags,
            backward_flags,
        );
        self.index_pair(forward_edge / 2);
        Ok(forward_edge)
    }

    /// Sets the forward geometry of a pair and refreshes its spatial index entry.
    pub fn set_edge_geometry(
        &mut self,
        edge_index: EdgeIndex,
        points: &[(i32, i32)],
    ) -> Result<(), Error> {
        if edge_index >= self.edges.len() {
            return Err(Error::InvalidEdge(edge_index));
        }
        let pair_index = edge_index / 2;
        let old = self.pair_envelope(pair_index);
        self.edges.cursor_mut(pair_index * 2).set_geometry(points);
        self.spatial_index.remove(&old);
        self.spatial_index.insert(self.pair_envelope(pair_index));
        Ok(())
    }

    /// Edges leaving `vertex`; empty for vertices without edges
    pub fn outgoing_edges(&self, vertex: VertexIndex) -> &[EdgeIndex] {
        self.outgoing.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Edges entering `vertex`; empty for vertices without edges
    pub fn incoming_edges(&self, vertex: VertexIndex) -> &[EdgeIndex] {
        self.incoming.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Rebuilds adjacency lists and the spatial index from the stores.
    pub fn build_indexes(&mut self) {
        let vertex_count = self.vertices.len();
        self.outgoing = vec![Vec::new(); vertex_count];
        self.incoming = vec![Vec::new(); vertex_count];

        let mut edge = self.edges.cursor(&self.vertices);
        while edge.advance() {
            self.outgoing[edge.from_vertex()].push(edge.index());
            self.incoming[edge.to_vertex()].push(edge.index());
        }

        let envelopes = (0..self.edges.pair_count())
            .map(|pair_index| self.pair_envelope(pair_index))
            .collect();
        self.spatial_index = RTree::bulk_load(envelopes);

        info!(
            "Indexed street layer: {} vertices, {} edges",
            vertex_count,
            self.edges.len()
        );
    }

    /// Finds the closest point on any edge strictly within `radius_m` meters.
    ///
    /// Ties are broken by the lower edge index, so results are deterministic.
    pub fn find_split(&self, lat: f64, lon: f64, radius_m: f64) -> Option<Split> {
        if radius_m.is_nan() || radius_m <= 0.0 {
            return None;
        }

        let radius_lat = radius_m / METERS_PER_DEGREE;
        let radius_lon = radius_m / (METERS_PER_DEGREE * lat.to_radians().cos().max(1e-6));
        let query = AABB::from_corners(
            [lon - radius_lon, lat - radius_lat],
            [lon + radius_lon, lat + radius_lat],
        );

        let fixed_lat = floating_to_fixed(lat);
        let fixed_lon = floating_to_fixed(lon);
        let mut edge = self.edge_cursor();
        let mut best: Option<Split> = None;

        for candidate in self.spatial_index.locate_in_envelope_intersecting(&query) {
            edge.seek(candidate.pair_index * 2);
            let split = Split::project(&edge, fixed_lat, fixed_lon);
            if split.distance_to_edge_m() >= radius_m {
                continue;
            }
            let closer = best.is_none_or(|b| {
                (split.distance_to_edge_mm, split.edge) < (b.distance_to_edge_mm, b.edge)
            });
            if closer {
                best = Some(split);
            }
        }
        best
    }

    /// Like `find_split`, but reports a missing street as an error.
    pub fn require_split(&self, lat: f64, lon: f64, radius_m: f64) -> Result<Split, Error> {
        self.find_split(lat, lon, radius_m)
            .ok_or(Error::NoSplitFound { lat, lon, radius_m })
    }

    /// Permanently splits the pair at `split`, returning the new vertex.
    ///
    /// The pair is replaced by two pairs meeting at the new vertex, carrying the
    /// original flags, speeds, name and geometry.
    pub fn split_edge(&mut self, split: &Split) -> Result<VertexIndex, Error> {
        if split.edge >= self.edges.len() {
            return Err(Error::InvalidEdge(split.edge));
        }

        let (forward, backward, source_id, name, points, from, to) = {
            let mut edge = self.edge(split.edge);
            let forward = (edge.flags(), edge.speed());
            edge.seek(split.edge + 1);
            let backward = (edge.flags(), edge.speed());
            let name = (!edge.has_bogus_name()).then(|| edge.name().to_owned());
            (
                forward,
                backward,
                edge.source_id(),
                name,
                edge.intermediate_points().to_vec(),
                edge.to_vertex(),
                edge.from_vertex(),
            )
        };
        if (from, to) != (split.vertex0, split.vertex1) {
            return Err(Error::InvalidData(format!(
                "split endpoints ({}, {}) do not match edge {} ({from}, {to})",
                split.vertex0, split.vertex1, split.edge
            )));
        }

        let new_vertex = self.vertices.add_vertex_fixed(
            split.fixed_lat,
            split.fixed_lon,
            super::vertex_store::INVALID_SOURCE_ID,
            None,
        );

        let cut = (split.segment * 2).min(points.len());
        let parts = [
            (from, new_vertex, split.distance0_mm, &points[..cut]),
            (new_vertex, to, split.distance1_mm, &points[cut..]),
        ];
        for (part_from, part_to, length_mm, intermediates) in parts {
            let edge = self.edges.add_edge_pair(
                part_from,
                part_to,
                length_mm,
                source_id,
                name.as_deref(),
                forward.1,
                backward.1,
                forward.0,
                backward.0,
            );
            self.edges
                .cursor_mut(edge)
                .set_intermediate_points(intermediates.to_vec());
        }

        self.edges.remove(&[split.edge]);
        self.build_indexes();

        debug!(
            "Split edge {} at vertex {new_vertex} ({} mm / {} mm)",
            split.edge, split.distance0_mm, split.distance1_mm
        );
        Ok(new_vertex)
    }

    /// Removes the pairs containing `edges` and rebuilds the indexes.
    pub fn remove_edges(&mut self, edges: &[EdgeIndex]) -> Result<(), Error> {
        if let Some(&edge) = edges.iter().find(|&&e| e >= self.edges.len()) {
            return Err(Error::InvalidEdge(edge));
        }
        self.edges.remove(edges);
        self.build_indexes();
        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        let mut edge = self.edges.cursor(&self.vertices);
        while edge.advance() {
            for vertex in [edge.from_vertex(), edge.to_vertex()] {
                if vertex >= self.vertices.len() {
                    return Err(Error::InvalidData(format!(
                        "edge {} references missing vertex {vertex}",
                        edge.index()
                    )));
                }
            }
        }
        Ok(())
    }

    fn grow_adjacency(&mut self, vertex: VertexIndex) {
        if self.outgoing.len() <= vertex {
            self.outgoing.resize_with(vertex + 1, Vec::new);
            self.incoming.resize_with(vertex + 1, Vec::new);
        }
    }

    fn index_pair(&mut self, pair_index: usize) {
        let forward = pair_index * 2;
        let edge = self.edge(forward);
        let (from, to) = (edge.from_vertex(), edge.to_vertex());
        self.grow_adjacency(from.max(to));

        self.outgoing[from].push(forward);
        self.incoming[to].push(forward);
        self.outgoing[to].push(forward + 1);
        self.incoming[from].push(forward + 1);

        self.spatial_index.insert(self.pair_envelope(pair_index));
    }

    fn pair_envelope(&self, pair_index: usize) -> EdgePairEnvelope {
        let rect = self.edge(pair_index * 2).envelope();
        EdgePairEnvelope {
            pair_index,
            bbox: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        }
    }
}
