//! Skinning packer (vertex group weights -> bone_weight / bone_index arrays)

use crate::error::ExportError;
use crate::scene::MeshSnapshot;
use crate::skeleton::BoneIndexTable;

/// Bone influences per vertex (4 x 8-bit slots in one u32)
pub const MAX_INFLUENCES: usize = 4;

/// Bits per packed bone index slot
const SLOT_BITS: u32 = 8;

/// Flat skinning arrays for a mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedSkinning {
    /// 4 weights per vertex, zero-padded
    pub weights: Vec<f32>,
    /// One packed u32 per vertex, slot `n` in bits `8n..8n+8`
    pub indices: Vec<u32>,
}

/// Pack up to 4 nonzero bone influences per vertex.
///
/// Memberships are taken in their native order. Groups that do not name a
/// deforming bone are ignored. Weights are passed through unchanged, without
/// renormalization. A vertex with more than 4 influences is rejected.
pub fn pack_skinning(
    mesh: &MeshSnapshot,
    table: &BoneIndexTable,
) -> Result<PackedSkinning, ExportError> {
    let vertex_count = mesh.vertex_count();
    let mut weights = Vec::with_capacity(vertex_count * MAX_INFLUENCES);
    let mut indices = Vec::with_capacity(vertex_count);

    for (vertex_idx, vertex) in mesh.vertices.iter().enumerate() {
        let influences: Vec<(u32, f32)> = vertex
            .groups
            .iter()
            .filter(|g| g.weight > 0.0)
            .filter_map(|g| table.index_of(&g.group).map(|bone| (bone, g.weight)))
            .collect();

        if influences.len() > MAX_INFLUENCES {
            return Err(ExportError::TooManyInfluences {
                vertex: vertex_idx,
                count: influences.len(),
            });
        }

        let mut packed = 0u32;
        for (slot, &(bone, weight)) in influences.iter().enumerate() {
            weights.push(weight);
            packed |= bone << (SLOT_BITS * slot as u32);
        }
        weights.resize(weights.len() + MAX_INFLUENCES - influences.len(), 0.0);
        indices.push(packed);
    }

    Ok(PackedSkinning { weights, indices })
}

/// Split a packed index back into its 4 slots (lowest slot first).
pub fn unpack_bone_indices(packed: u32) -> [u8; 4] {
    packed.to_le_bytes()
}
