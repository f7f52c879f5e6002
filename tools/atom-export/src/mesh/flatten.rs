//! Geometry flattening

use super::types::FlatGeometry;
use crate::scene::MeshSnapshot;

/// Flatten a validated, triangulated mesh into position/normal/index arrays.
///
/// Positions and normals are emitted in vertex-index order, not per corner.
/// Vertices are never split, since texture coordinates are not exported.
pub fn flatten_geometry(mesh: &MeshSnapshot) -> FlatGeometry {
    let vertex_count = mesh.vertex_count();
    let mut positions = Vec::with_capacity(vertex_count * 3);
    let mut normals = Vec::with_capacity(vertex_count * 3);
    let mut indices = Vec::with_capacity(mesh.face_count() * 3);

    for vertex in &mesh.vertices {
        positions.extend_from_slice(&vertex.position);
        normals.extend_from_slice(&vertex.normal);
    }

    for face in &mesh.faces {
        indices.extend_from_slice(&face.0);
    }

    FlatGeometry {
        positions,
        normals,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Face, Vertex};

    #[test]
    fn test_flatten_keeps_vertex_order() {
        let mesh = MeshSnapshot {
            vertices: vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
            ],
            faces: vec![Face::triangle(0, 1, 2), Face::triangle(2, 1, 3)],
        };

        let flat = flatten_geometry(&mesh);

        assert_eq!(flat.vertex_count(), 4);
        assert_eq!(flat.triangle_count(), 2);
        assert_eq!(flat.positions.len(), 12);
        assert_eq!(flat.normals.len(), flat.positions.len());
        assert_eq!(&flat.positions[3..6], &[1.0, 0.0, 0.0]);
        assert_eq!(&flat.normals[9..12], &[0.0, 0.0, -1.0]);
        assert_eq!(flat.indices, vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn test_unreferenced_vertices_are_kept() {
        let mesh = MeshSnapshot {
            vertices: vec![Vertex::new([5.0, 5.0, 5.0], [0.0, 1.0, 0.0])],
            faces: Vec::new(),
        };
        let flat = flatten_geometry(&mesh);
        assert_eq!(flat.positions, vec![5.0, 5.0, 5.0]);
        assert!(flat.indices.is_empty());
    }
}
