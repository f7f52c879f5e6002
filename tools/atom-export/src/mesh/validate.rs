//! Validation gate run before any conversion

use crate::error::ValidationError;
use crate::scene::MeshSnapshot;

/// True when every face of the mesh is a triangle.
pub fn has_triangles_only(mesh: &MeshSnapshot) -> bool {
    mesh.faces.iter().all(|face| face.arity() == 3)
}

/// Reject meshes that are not triangulated, reference missing vertices or
/// carry NaN/inf coordinates (JSON has no encoding for them).
///
/// Violations are rejected, never repaired.
pub fn validate_mesh(mesh: &MeshSnapshot) -> Result<(), ValidationError> {
    let vertex_count = mesh.vertex_count();

    if let Some(vertex) = mesh.vertices.iter().position(|v| {
        !v.position
            .iter()
            .chain(v.normal.iter())
            .all(|c| c.is_finite())
    }) {
        return Err(ValidationError::NonFiniteVertex { vertex });
    }

    for (face_idx, face) in mesh.faces.iter().enumerate() {
        if face.arity() != 3 {
            return Err(ValidationError::NonTriangleFace {
                face: face_idx,
                arity: face.arity(),
            });
        }

        if let Some(&vertex) = face.0.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(ValidationError::VertexOutOfRange {
                face: face_idx,
                vertex,
                vertex_count,
            });
        }
    }

    Ok(())
}
