//! Skeleton builder (armature -> exported bone records)
//!
//! Only deforming bones are exported. They receive dense indices in hierarchy
//! order, and those indices are what the packed skinning data refers to.

use glam::{Mat3, Mat4, Vec3};
use hashbrown::HashMap;

use crate::error::ExportError;
use crate::scene::{Armature, Bone};

/// Bone indices are stored in 8-bit slots
pub const MAX_BONES: usize = 256;

/// Dense index space over the deforming bones of an armature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoneIndexTable {
    names: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl BoneIndexTable {
    /// Number deforming bones in encounter order, skipping helper bones.
    pub fn build(bones: &[Bone]) -> Result<Self, ExportError> {
        let mut table = Self::default();

        for bone in bones.iter().filter(|b| b.deform) {
            table.lookup.insert(bone.name.clone(), table.names.len() as u32);
            table.names.push(bone.name.clone());
        }

        if table.names.len() > MAX_BONES {
            return Err(ExportError::TooManyBones(table.names.len()));
        }

        Ok(table)
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.lookup.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One deforming bone ready for serialization
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedBone {
    pub name: String,
    pub index: u32,
    pub head: [f32; 3],
    pub tail: [f32; 3],
    pub head_local: [f32; 3],
    pub tail_local: [f32; 3],
    pub x_axis: [f32; 3],
    pub y_axis: [f32; 3],
    pub z_axis: [f32; 3],
    /// Dense index of the nearest deforming ancestor
    pub parent: Option<u32>,
}

/// Result of skeleton conversion
#[derive(Debug, Clone)]
pub struct ConvertedSkeleton {
    pub table: BoneIndexTable,
    /// Exported bones in dense index order
    pub bones: Vec<ExportedBone>,
}

impl ConvertedSkeleton {
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }
}

/// Positions of every bone by name, with parent links checked.
fn index_hierarchy(bones: &[Bone]) -> Result<HashMap<&str, usize>, ExportError> {
    let mut positions = HashMap::with_capacity(bones.len());

    for (i, bone) in bones.iter().enumerate() {
        if positions.insert(bone.name.as_str(), i).is_some() {
            return Err(ExportError::InvalidSkeleton(format!(
                "duplicate bone name '{}'",
                bone.name
            )));
        }
    }

    for bone in bones {
        if let Some(parent) = &bone.parent {
            if !positions.contains_key(parent.as_str()) {
                return Err(ExportError::InvalidSkeleton(format!(
                    "bone '{}' has unknown parent '{}'",
                    bone.name, parent
                )));
            }
        }
    }

    Ok(positions)
}

/// Hierarchy positions from `start` up to the root, `start` first.
fn parent_chain(
    bones: &[Bone],
    positions: &HashMap<&str, usize>,
    start: usize,
) -> Result<Vec<usize>, ExportError> {
    let mut chain = vec![start];
    let mut current = start;

    while let Some(parent) = &bones[current].parent {
        current = positions[parent.as_str()];
        if chain.len() >= bones.len() {
            return Err(ExportError::InvalidSkeleton(format!(
                "parent cycle through bone '{}'",
                bones[start].name
            )));
        }
        chain.push(current);
    }

    Ok(chain)
}

/// Orientation of a bone composed with all of its ancestors.
///
/// The chain is folded child-first, so the bone's own matrix is applied
/// before its parent's: `root * ... * parent * bone`.
fn composed_orientation(bones: &[Bone], chain: &[usize]) -> Mat3 {
    chain.iter().fold(Mat3::IDENTITY, |acc, &i| {
        Mat3::from_cols_array_2d(&bones[i].matrix) * acc
    })
}

/// Transform a point with homogeneous divide.
fn to_point(world: &Mat4, p: [f32; 3]) -> [f32; 3] {
    world.project_point3(Vec3::from(p)).to_array()
}

/// Nearest deforming ancestor of `chain[0]`, and the non-deforming
/// immediate parent that was skipped to reach it (if any).
fn resolve_parent<'a>(
    bones: &'a [Bone],
    table: &BoneIndexTable,
    chain: &[usize],
) -> (Option<u32>, Option<&'a str>) {
    let parent = chain[1..].iter().find_map(|&i| table.index_of(&bones[i].name));
    let skipped = chain
        .get(1)
        .map(|&i| &bones[i])
        .filter(|b| !b.deform)
        .map(|b| b.name.as_str());
    (parent, skipped)
}

/// Convert an armature to exported bone records.
pub fn build_skeleton(armature: &Armature) -> Result<ConvertedSkeleton, ExportError> {
    let bones = &armature.bones;
    let positions = index_hierarchy(bones)?;
    let table = BoneIndexTable::build(bones)?;
    let world = Mat4::from_cols_array_2d(&armature.world_matrix);

    let mut exported = Vec::with_capacity(table.len());

    for (pos, bone) in bones.iter().enumerate() {
        let Some(index) = table.index_of(&bone.name) else {
            tracing::debug!("Skipping non-deforming bone '{}'", bone.name);
            continue;
        };

        let chain = parent_chain(bones, &positions, pos)?;
        let orientation = composed_orientation(bones, &chain);

        let (parent, skipped) = resolve_parent(bones, &table, &chain);
        if let Some(helper) = skipped {
            tracing::warn!(
                "Bone '{}' has non-deforming parent '{}', re-parented to {:?}",
                bone.name,
                helper,
                parent.map(|p| table.names()[p as usize].as_str())
            );
        }

        tracing::debug!("Exporting bone '{}' as {}", bone.name, index);

        exported.push(ExportedBone {
            name: bone.name.clone(),
            index,
            head: to_point(&world, bone.head),
            tail: to_point(&world, bone.tail),
            head_local: to_point(&world, bone.head_local),
            tail_local: to_point(&world, bone.tail_local),
            x_axis: (orientation * Vec3::X).to_array(),
            y_axis: (orientation * Vec3::Y).to_array(),
            z_axis: (orientation * Vec3::Z).to_array(),
            parent,
        });
    }

    Ok(ConvertedSkeleton {
        table,
        bones: exported,
    })
}
