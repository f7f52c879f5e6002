//! Triangle edge adjacency

use hashbrown::HashMap;

use super::types::Topology;
use crate::error::ExportError;
use crate::scene::MeshSnapshot;

/// Neighbor value for an edge that belongs to a single triangle
pub const BOUNDARY: i32 = -1;

/// Unordered vertex pair; both windings of a shared edge hash identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(u32, u32);

impl EdgeKey {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn vertices(&self) -> (u32, u32) {
        (self.0, self.1)
    }
}

/// Edge keys of a triangle, in corner order: (0,1), (1,2), (2,0)
fn triangle_edges(tri: &[u32]) -> [EdgeKey; 3] {
    [
        EdgeKey::new(tri[0], tri[1]),
        EdgeKey::new(tri[1], tri[2]),
        EdgeKey::new(tri[2], tri[0]),
    ]
}

/// Build per-triangle-edge adjacency for a validated triangle mesh.
///
/// Fails with [`ExportError::MalformedTopology`] when an edge is shared by
/// more than two triangles.
pub fn build_topology(mesh: &MeshSnapshot) -> Result<Topology, ExportError> {
    let mut edges: HashMap<EdgeKey, Vec<u32>> = HashMap::with_capacity(mesh.face_count() * 3 / 2);

    for (tri_idx, face) in mesh.faces.iter().enumerate() {
        for key in triangle_edges(&face.0) {
            edges.entry(key).or_default().push(tri_idx as u32);
        }
    }

    let mut neighbors = Vec::with_capacity(mesh.face_count() * 3);

    for (tri_idx, face) in mesh.faces.iter().enumerate() {
        for key in triangle_edges(&face.0) {
            let shared = edges.get(&key).map(Vec::as_slice).unwrap_or_default();
            let neighbor = match shared {
                [_] => BOUNDARY,
                [a, b] if *a as usize == tri_idx && *b as usize != tri_idx => *b as i32,
                [a, b] if *b as usize == tri_idx && *a as usize != tri_idx => *a as i32,
                _ => {
                    let (v0, v1) = key.vertices();
                    return Err(ExportError::MalformedTopology(v0, v1, shared.len()));
                }
            };
            neighbors.push(neighbor);
        }
    }

    tracing::debug!(
        "Built topology: {} triangles, {} unique edges",
        mesh.face_count(),
        edges.len()
    );

    Ok(Topology { neighbors })
}

/// Fail with [`ExportError::OpenTopology`] if any edge is a boundary edge.
pub fn require_closed(topology: &Topology) -> Result<(), ExportError> {
    match topology.neighbors.iter().position(|&n| n == BOUNDARY) {
        Some(entry) => Err(ExportError::OpenTopology {
            triangle: entry / 3,
        }),
        None => Ok(()),
    }
}
