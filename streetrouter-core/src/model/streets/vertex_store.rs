//! Column store of street vertices
//!
//! Coordinates are stored as fixed-point integers (degrees scaled by 10^7).
//! Vertices are read and written through cursors instead of per-vertex objects.

use geo::{Coord, Point, Rect};

use super::names::NameTable;
use crate::{SourceId, VertexIndex};

/// Scale factor between floating degrees and fixed-point degrees
pub const FIXED_FACTOR: f64 = 1e7;

/// Source id meaning "not taken from the source data"
pub const INVALID_SOURCE_ID: SourceId = 0;

/// Converts floating-point degrees to fixed-point degrees.
#[allow(clippy::cast_possible_truncation)]
pub fn floating_to_fixed(degrees: f64) -> i32 {
    (degrees * FIXED_FACTOR).round() as i32
}

/// Converts fixed-point degrees back to floating-point degrees.
pub fn fixed_to_floating(fixed: i32) -> f64 {
    f64::from(fixed) / FIXED_FACTOR
}

#[derive(Debug, Clone, Default)]
pub struct VertexStore {
    fixed_lats: Vec<i32>,
    fixed_lons: Vec<i32>,
    source_ids: Vec<SourceId>,
    names: NameTable,
    envelope: Option<Rect<f64>>,
    /// Counter for generated ids of vertices not present in the source data
    created_vertices: i64,
}

impl VertexStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fixed_lats: Vec::with_capacity(capacity),
            fixed_lons: Vec::with_capacity(capacity),
            source_ids: Vec::with_capacity(capacity),
            names: NameTable::with_capacity(capacity / 8),
            envelope: None,
            created_vertices: 0,
        }
    }

    /// Adds a vertex given in floating-point degrees and returns its index.
    pub fn add_vertex(
        &mut self,
        lat: f64,
        lon: f64,
        source_id: SourceId,
        name: Option<&str>,
    ) -> VertexIndex {
        self.add_vertex_fixed(
            floating_to_fixed(lat),
            floating_to_fixed(lon),
            source_id,
            name,
        )
    }

    /// Adds a vertex given in fixed-point degrees and returns its index.
    ///
    /// Vertices without a source id (created by splitting edges) receive
    /// generated negative ids so they remain distinguishable.
    pub fn add_vertex_fixed(
        &mut self,
        fixed_lat: i32,
        fixed_lon: i32,
        source_id: SourceId,
        name: Option<&str>,
    ) -> VertexIndex {
        let index = self.fixed_lats.len();
        self.fixed_lats.push(fixed_lat);
        self.fixed_lons.push(fixed_lon);

        let source_id = if source_id == INVALID_SOURCE_ID {
            self.created_vertices += 1;
            -self.created_vertices
        } else {
            source_id
        };
        self.source_ids.push(source_id);

        if let Some(name) = name {
            self.names.insert(source_id, name);
        }
        self.expand_envelope(fixed_lat, fixed_lon);

        index
    }

    pub fn len(&self) -> usize {
        self.fixed_lats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed_lats.is_empty()
    }

    /// Bounding rectangle (lon/lat) of every coordinate ever stored
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.envelope
    }

    /// Cursor positioned before the first vertex, to be moved with `advance`.
    pub fn cursor(&self) -> Vertex<'_> {
        Vertex {
            store: self,
            index: usize::MAX,
        }
    }

    /// Cursor positioned at `index`.
    pub fn cursor_at(&self, index: VertexIndex) -> Vertex<'_> {
        Vertex { store: self, index }
    }

    /// Writing cursor positioned at `index`.
    pub fn cursor_mut(&mut self, index: VertexIndex) -> VertexMut<'_> {
        VertexMut { store: self, index }
    }

    pub(crate) fn fixed_coords(&self, index: VertexIndex) -> (i32, i32) {
        (self.fixed_lats[index], self.fixed_lons[index])
    }

    fn expand_envelope(&mut self, fixed_lat: i32, fixed_lon: i32) {
        let coord = Coord {
            x: fixed_to_floating(fixed_lon),
            y: fixed_to_floating(fixed_lat),
        };
        self.envelope = Some(match self.envelope {
            None => Rect::new(coord, coord),
            Some(rect) => {
                let min = Coord {
                    x: rect.min().x.min(coord.x),
                    y: rect.min().y.min(coord.y),
                };
                let max = Coord {
                    x: rect.max().x.max(coord.x),
                    y: rect.max().y.max(coord.y),
                };
                Rect::new(min, max)
            }
        });
    }
}

/// Read cursor over the vertex store
#[derive(Debug, Clone, Copy)]
pub struct Vertex<'a> {
    store: &'a VertexStore,
    index: VertexIndex,
}

impl<'a> Vertex<'a> {
    /// Moves to the next vertex, returning `false` once past the end.
    pub fn advance(&mut self) -> bool {
        self.index = self.index.wrapping_add(1);
        self.index < self.store.len()
    }

    pub fn seek(&mut self, index: VertexIndex) {
        self.index = index;
    }

    pub fn index(&self) -> VertexIndex {
        self.index
    }

    pub fn fixed_lat(&self) -> i32 {
        self.store.fixed_lats[self.index]
    }

    pub fn fixed_lon(&self) -> i32 {
        self.store.fixed_lons[self.index]
    }

    pub fn lat(&self) -> f64 {
        fixed_to_floating(self.fixed_lat())
    }

    pub fn lon(&self) -> f64 {
        fixed_to_floating(self.fixed_lon())
    }

    /// Vertex position as a `Point` (x = lon, y = lat)
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon(), self.lat())
    }

    pub fn source_id(&self) -> SourceId {
        self.store.source_ids[self.index]
    }

    pub fn name(&self) -> Option<&'a str> {
        self.store.names.get(self.source_id())
    }

    pub fn label(&self) -> String {
        format!("osm:id:{}", self.source_id())
    }
}

/// Write cursor over the vertex store
#[derive(Debug)]
pub struct VertexMut<'a> {
    store: &'a mut VertexStore,
    index: VertexIndex,
}

impl VertexMut<'_> {
    pub fn seek(&mut self, index: VertexIndex) {
        self.index = index;
    }

    pub fn index(&self) -> VertexIndex {
        self.index
    }

    pub fn set_lat(&mut self, lat: f64) {
        let fixed = floating_to_fixed(lat);
        self.store.fixed_lats[self.index] = fixed;
        let lon = self.store.fixed_lons[self.index];
        self.store.expand_envelope(fixed, lon);
    }

    pub fn set_lon(&mut self, lon: f64) {
        let fixed = floating_to_fixed(lon);
        self.store.fixed_lons[self.index] = fixed;
        let lat = self.store.fixed_lats[self.index];
        self.store.expand_envelope(lat, fixed);
    }

    pub fn set_lat_lon(&mut self, lat: f64, lon: f64) {
        self.set_lat(lat);
        self.set_lon(lon);
    }

    pub fn set_name(&mut self, name: &str) {
        let source_id = self.store.source_ids[self.index];
        self.store.names.insert(source_id, name);
    }

    pub fn lat(&self) -> f64 {
        fixed_to_floating(self.store.fixed_lats[self.index])
    }

    pub fn lon(&self) -> f64 {
        fixed_to_floating(self.store.fixed_lons[self.index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_conversion_rounds_to_resolution() {
        let fixed = floating_to_fixed(52.520_008_3);
        assert_eq!(fixed, 525_200_083);
        assert!((fixed_to_floating(fixed) - 52.520_008_3).abs() < 1e-7);
        assert_eq!(floating_to_fixed(-13.404_954), -134_049_540);
    }

    #[test]
    fn add_vertex_returns_sequential_indices() {
        let mut store = VertexStore::default();
        let a = store.add_vertex(46.05, 14.50, 100, Some("Prešeren Square"));
        let b = store.add_vertex(46.06, 14.51, 101, None);

        assert_eq!((a, b), (0, 1));
        assert_eq!(store.len(), 2);

        let vertex = store.cursor_at(a);
        assert_eq!(vertex.source_id(), 100);
        assert_eq!(vertex.name(), Some("Prešeren Square"));
        assert_eq!(vertex.label(), "osm:id:100");
        assert!(store.cursor_at(b).name().is_none());
    }

    #[test]
    fn created_vertices_get_negative_ids() {
        let mut store = VertexStore::default();
        let a = store.add_vertex(1.0, 1.0, INVALID_SOURCE_ID, None);
        let b = store.add_vertex(1.0, 2.0, INVALID_SOURCE_ID, None);

        assert_eq!(store.cursor_at(a).source_id(), -1);
        assert_eq!(store.cursor_at(b).source_id(), -2);
    }

    #[test]
    fn cursor_advance_visits_every_vertex() {
        let mut store = VertexStore::default();
        for i in 0..5 {
            store.add_vertex(f64::from(i), 0.0, i64::from(i) + 1, None);
        }

        let mut cursor = store.cursor();
        let mut visited = Vec::new();
        while cursor.advance() {
            visited.push(cursor.index());
        }
        assert_eq!(visited, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn envelope_tracks_inserted_and_moved_vertices() {
        let mut store = VertexStore::default();
        store.add_vertex(10.0, 20.0, 1, None);
        let b = store.add_vertex(11.0, 19.0, 2, None);
        store.cursor_mut(b).set_lat_lon(12.0, 18.5);

        let envelope = store.envelope().expect("non-empty store has an envelope");
        assert!((envelope.min().x - 18.5).abs() < 1e-9);
        assert!((envelope.max().x - 20.0).abs() < 1e-9);
        assert!((envelope.min().y - 10.0).abs() < 1e-9);
        assert!((envelope.max().y - 12.0).abs() < 1e-9);
        assert!((store.cursor_at(b).lat() - 12.0).abs() < 1e-9);
    }
}
