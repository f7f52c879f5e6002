//! Atom model document (.m3d)
//!
//! JSON layout read by the engine's model loader:
//!
//! ```text
//! { "mesh": {
//!     "arrays":   { "<name>": { "type": "f32" | "u32" | "i32", "data": [...] }, ... },
//!     "skeleton": { "bones": { "<bone name>": { "index": 0, "head": [..], ... } } } } }
//! ```

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use crate::mesh::{FlatGeometry, Topology};
use crate::skeleton::{ConvertedSkeleton, ExportedBone};
use crate::skinning::PackedSkinning;

/// File extension of exported models
pub const M3D_EXT: &str = "m3d";

/// Flat typed buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ElementArray {
    F32(Vec<f32>),
    U32(Vec<u32>),
    I32(Vec<i32>),
}

impl ElementArray {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementArray::F32(_) => "f32",
            ElementArray::U32(_) => "u32",
            ElementArray::I32(_) => "i32",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ElementArray::F32(d) => d.len(),
            ElementArray::U32(d) => d.len(),
            ElementArray::I32(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrays {
    pub vertices: ElementArray,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<ElementArray>,
    pub indices: ElementArray,
    pub topology: ElementArray,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone_weight: Option<ElementArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone_index: Option<ElementArray>,
}

impl Arrays {
    /// Named arrays present in the document, in serialization order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ElementArray)> {
        [
            ("vertices", Some(&self.vertices)),
            ("normals", self.normals.as_ref()),
            ("indices", Some(&self.indices)),
            ("topology", Some(&self.topology)),
            ("bone_weight", self.bone_weight.as_ref()),
            ("bone_index", self.bone_index.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, array)| array.map(|a| (name, a)))
    }
}

/// Exported record of one deforming bone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    /// Dense bone index
    pub index: u32,
    pub head: [f32; 3],
    pub tail: [f32; 3],
    pub head_local: [f32; 3],
    pub tail_local: [f32; 3],
    pub x: [f32; 3],
    pub y: [f32; 3],
    pub z: [f32; 3],
    /// Dense index of the parent bone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
}

impl From<&ExportedBone> for BoneRecord {
    fn from(bone: &ExportedBone) -> Self {
        Self {
            index: bone.index,
            head: bone.head,
            tail: bone.tail,
            head_local: bone.head_local,
            tail_local: bone.tail_local,
            x: bone.x_axis,
            y: bone.y_axis,
            z: bone.z_axis,
            parent: bone.parent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub bones: BTreeMap<String, BoneRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    pub arrays: Arrays,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<SkeletonNode>,
}

/// Complete .m3d document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub mesh: MeshNode,
}

impl Document {
    /// Assemble a document from converted parts.
    ///
    /// Skinning arrays and the skeleton are only emitted together.
    pub fn assemble(
        geometry: FlatGeometry,
        topology: Topology,
        rig: Option<(ConvertedSkeleton, PackedSkinning)>,
        export_normals: bool,
    ) -> Self {
        let (skeleton, bone_weight, bone_index) = match rig {
            Some((skeleton, skinning)) => {
                let bones = skeleton
                    .bones
                    .iter()
                    .map(|b| (b.name.clone(), BoneRecord::from(b)))
                    .collect();
                (
                    Some(SkeletonNode { bones }),
                    Some(ElementArray::F32(skinning.weights)),
                    Some(ElementArray::U32(skinning.indices)),
                )
            }
            None => (None, None, None),
        };

        Self {
            mesh: MeshNode {
                arrays: Arrays {
                    vertices: ElementArray::F32(geometry.positions),
                    normals: export_normals.then_some(ElementArray::F32(geometry.normals)),
                    indices: ElementArray::U32(geometry.indices),
                    topology: ElementArray::I32(topology.neighbors),
                    bone_weight,
                    bone_index,
                },
                skeleton,
            },
        }
    }

    pub fn skeleton(&self) -> Option<&SkeletonNode> {
        self.mesh.skeleton.as_ref()
    }

    pub fn arrays(&self) -> &Arrays {
        &self.mesh.arrays
    }

    /// Check the constraints the engine loader enforces.
    pub fn validate(&self) -> Result<()> {
        let arrays = self.arrays();

        for (name, array) in arrays.iter() {
            if array.is_empty() {
                bail!("Array '{}' is empty", name);
            }
        }

        if arrays.vertices.len() % 3 != 0 {
            bail!("Vertex array length {} is not a multiple of 3", arrays.vertices.len());
        }
        if arrays.indices.len() != arrays.topology.len() {
            bail!(
                "Topology has {} entries, expected {} (one per index)",
                arrays.topology.len(),
                arrays.indices.len()
            );
        }

        let vertex_count = arrays.vertices.len() / 3;
        if let Some(bone_index) = &arrays.bone_index {
            if bone_index.len() != vertex_count {
                bail!(
                    "bone_index has {} entries, expected {}",
                    bone_index.len(),
                    vertex_count
                );
            }
        }
        if let Some(bone_weight) = &arrays.bone_weight {
            if bone_weight.len() != vertex_count * 4 {
                bail!(
                    "bone_weight has {} entries, expected {}",
                    bone_weight.len(),
                    vertex_count * 4
                );
            }
        }

        if let Some(skeleton) = self.skeleton() {
            let count = skeleton.bones.len() as u32;
            for (name, bone) in &skeleton.bones {
                if bone.index >= count {
                    bail!("Too big bone index {} for '{}', max {}", bone.index, name, count);
                }
                if bone.parent.is_some_and(|p| p >= count) {
                    bail!("Bone '{}' has invalid parent index {:?}", name, bone.parent);
                }
            }
        }

        Ok(())
    }
}

/// Write a document, indented unless `compact` is set.
pub fn write_m3d<W: Write>(w: &mut W, document: &Document, compact: bool) -> io::Result<()> {
    if compact {
        serde_json::to_writer(&mut *w, document)?;
    } else {
        serde_json::to_writer_pretty(&mut *w, document)?;
    }
    w.flush()?;
    Ok(())
}

/// Read and validate a document.
pub fn read_m3d<R: Read>(r: R) -> Result<Document> {
    let document: Document = serde_json::from_reader(r)?;
    document.validate()?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn triangle_document() -> Document {
        let geometry = FlatGeometry {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
        };
        let topology = Topology {
            neighbors: vec![-1, -1, -1],
        };
        Document::assemble(geometry, topology, None, true)
    }

    #[test]
    fn test_array_tagging() {
        let json = serde_json::to_value(triangle_document()).unwrap();
        let arrays = &json["mesh"]["arrays"];
        assert_eq!(arrays["vertices"]["type"], "f32");
        assert_eq!(arrays["indices"]["type"], "u32");
        assert_eq!(arrays["topology"]["type"], "i32");
        assert_eq!(arrays["topology"]["data"][0], -1);
        assert!(arrays.get("bone_weight").is_none());
        assert!(json["mesh"].get("skeleton").is_none());
    }

    #[test]
    fn test_normals_can_be_omitted() {
        let mut doc = triangle_document();
        doc.mesh.arrays.normals = None;
        let names: Vec<&str> = doc.arrays().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["vertices", "indices", "topology"]);
    }

    #[test]
    fn test_bone_record_field_names() {
        let record = BoneRecord {
            index: 1,
            head: [0.0; 3],
            tail: [0.0, 1.0, 0.0],
            head_local: [0.0; 3],
            tail_local: [0.0, 1.0, 0.0],
            x: [1.0, 0.0, 0.0],
            y: [0.0, 1.0, 0.0],
            z: [0.0, 0.0, 1.0],
            parent: Some(0),
        };
        let json = serde_json::to_value(&record).unwrap();
        for key in ["index", "head", "tail", "head_local", "tail_local", "x", "y", "z"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["parent"], Value::from(0));

        let root = BoneRecord { parent: None, ..record };
        assert!(serde_json::to_value(&root).unwrap().get("parent").is_none());
    }

    #[test]
    fn test_write_and_read_back() {
        let doc = triangle_document();

        let mut pretty = Vec::new();
        write_m3d(&mut pretty, &doc, false).unwrap();
        let mut compact = Vec::new();
        write_m3d(&mut compact, &doc, true).unwrap();

        assert!(pretty.len() > compact.len());
        assert!(!compact.contains(&b'\n'));
        assert_eq!(read_m3d(pretty.as_slice()).unwrap(), doc);
    }

    #[test]
    fn test_validate_rejects_bad_bone_index() {
        let mut doc = triangle_document();
        let mut bones = BTreeMap::new();
        bones.insert(
            "Root".to_string(),
            BoneRecord {
                index: 3,
                head: [0.0; 3],
                tail: [0.0; 3],
                head_local: [0.0; 3],
                tail_local: [0.0; 3],
                x: [1.0, 0.0, 0.0],
                y: [0.0, 1.0, 0.0],
                z: [0.0, 0.0, 1.0],
                parent: None,
            },
        );
        doc.mesh.skeleton = Some(SkeletonNode { bones });
        let err = doc.validate().unwrap_err();
        assert!(err.to_string().contains("Too big bone index"));
    }

    #[test]
    fn test_validate_rejects_topology_mismatch() {
        let mut doc = triangle_document();
        doc.mesh.arrays.topology = ElementArray::I32(vec![-1]);
        assert!(doc.validate().is_err());
    }
}
