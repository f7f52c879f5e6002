//! Types for mesh conversion

/// Flattened geometry in vertex-index order (no deduplication or splitting)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatGeometry {
    /// 3 floats per vertex
    pub positions: Vec<f32>,
    /// 3 floats per vertex, same order as positions
    pub normals: Vec<f32>,
    /// 3 entries per triangle
    pub indices: Vec<u32>,
}

impl FlatGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Per-triangle-edge neighbor indices, 3 entries per triangle.
///
/// Entry `3 * t + e` is the triangle across edge `e` of triangle `t`, where
/// edge `e` runs from corner `e` to corner `(e + 1) % 3`, or
/// [`BOUNDARY`](super::BOUNDARY) when no triangle shares that edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub neighbors: Vec<i32>,
}

impl Topology {
    pub fn is_closed(&self) -> bool {
        !self.neighbors.contains(&super::BOUNDARY)
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
