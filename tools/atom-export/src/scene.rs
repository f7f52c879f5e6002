//! Scene snapshots supplied by the editing environment
//!
//! The host editor triangulates the object, applies its world transform and
//! recomputes normals before handing the data over. Everything here is plain
//! data; the exporter never mutates it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ExportError;

/// Weight of one vertex inside a named vertex group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    /// Group name, matches a bone name when the group drives skinning
    pub group: String,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Group memberships in the editor's native order
    #[serde(default)]
    pub groups: Vec<GroupWeight>,
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self {
            position,
            normal,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: &str, weight: f32) -> Self {
        self.groups.push(GroupWeight {
            group: group.to_string(),
            weight,
        });
        self
    }
}

/// A polygon in winding order. Exported faces must have exactly 3 vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Face(pub Vec<u32>);

impl Face {
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self(vec![a, b, c])
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl MeshSnapshot {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

fn default_deform() -> bool {
    true
}

fn identity3() -> [[f32; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

fn identity4() -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Rest-pose bone as stored by the editor's armature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Head relative to the parent bone
    pub head: [f32; 3],
    /// Tail relative to the parent bone
    pub tail: [f32; 3],
    /// Head in armature space
    pub head_local: [f32; 3],
    /// Tail in armature space
    pub tail_local: [f32; 3],
    /// Orientation relative to the parent, column-major 3x3
    #[serde(default = "identity3")]
    pub matrix: [[f32; 3]; 3],
    /// Helper and IK bones are non-deforming
    #[serde(default = "default_deform")]
    pub deform: bool,
}

impl Bone {
    /// Deforming bone with identity orientation and coincident frames.
    pub fn new(name: &str, parent: Option<&str>, head: [f32; 3], tail: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            head,
            tail,
            head_local: head,
            tail_local: tail,
            matrix: identity3(),
            deform: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armature {
    /// Armature object world transform, column-major 4x4
    #[serde(default = "identity4")]
    pub world_matrix: [[f32; 4]; 4],
    /// Bones in hierarchy order
    pub bones: Vec<Bone>,
}

impl Armature {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self {
            world_matrix: identity4(),
            bones,
        }
    }
}

/// Everything the exporter needs from one scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub name: String,
    pub mesh: MeshSnapshot,
    /// Present when the object is parented to an armature
    #[serde(default)]
    pub armature: Option<Armature>,
}

impl ObjectSnapshot {
    pub fn has_bones(&self) -> bool {
        self.armature.is_some()
    }
}

/// Supplier of object snapshots (the host editor, or a file standing in for it).
pub trait SceneSource {
    fn snapshot(&self, object: &str) -> Result<ObjectSnapshot, ExportError>;
}

/// Headless scene: a JSON file holding pre-processed object snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub objects: Vec<ObjectSnapshot>,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse scene: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.name.as_str())
    }
}

impl SceneSource for SceneFile {
    fn snapshot(&self, object: &str) -> Result<ObjectSnapshot, ExportError> {
        self.objects
            .iter()
            .find(|o| o.name == object)
            .cloned()
            .ok_or_else(|| ExportError::ObjectNotFound(object.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_defaults() {
        let json = r#"{
            "objects": [{
                "name": "Tri",
                "mesh": {
                    "vertices": [
                        {"position": [0, 0, 0], "normal": [0, 0, 1]},
                        {"position": [1, 0, 0], "normal": [0, 0, 1]},
                        {"position": [0, 1, 0], "normal": [0, 0, 1], "groups": [{"group": "Root", "weight": 1.0}]}
                    ],
                    "faces": [[0, 1, 2]]
                },
                "armature": {
                    "bones": [{"name": "Root", "head": [0,0,0], "tail": [0,1,0], "head_local": [0,0,0], "tail_local": [0,1,0]}]
                }
            }]
        }"#;
        let scene = SceneFile::parse(json).unwrap();
        let object = scene.snapshot("Tri").unwrap();
        assert_eq!(object.mesh.vertex_count(), 3);
        assert_eq!(object.mesh.faces[0], Face::triangle(0, 1, 2));
        assert_eq!(object.mesh.vertices[2].groups[0].group, "Root");

        let armature = object.armature.unwrap();
        assert!(armature.bones[0].deform);
        assert_eq!(armature.bones[0].parent, None);
        assert_eq!(armature.world_matrix, identity4());
    }

    #[test]
    fn test_missing_object() {
        let scene = SceneFile::default();
        let err = scene.snapshot("Ghost").unwrap_err();
        assert!(matches!(err, ExportError::ObjectNotFound(name) if name == "Ghost"));
    }
}
