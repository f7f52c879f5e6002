//! Export settings (atom.toml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default settings file name, looked up in the working directory
pub const MANIFEST_FILE: &str = "atom.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    #[serde(default)]
    pub scene: SceneSection,
    #[serde(default)]
    pub export: ExportSettings,
}

/// Where exported models go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSection {
    /// Engine data directory; `~/` expands to the home directory
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    /// Subdirectory of `base_dir` holding .m3d files
    #[serde(default = "default_mesh_dir")]
    pub mesh_dir: String,
}

/// Per-export switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Export skeleton and skinning when the object has an armature
    #[serde(default = "default_true")]
    pub bones: bool,
    #[serde(default = "default_true")]
    pub normals: bool,
    /// Reject meshes with boundary edges
    #[serde(default)]
    pub closed_topology: bool,
    /// Compact JSON instead of indented
    #[serde(default)]
    pub compact: bool,
}

fn default_true() -> bool { true }
fn default_base_dir() -> String { "~/dev/mm/data/".to_string() }
fn default_mesh_dir() -> String { "mesh".to_string() }

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            mesh_dir: default_mesh_dir(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            bones: true,
            normals: true,
            closed_topology: false,
            compact: false,
        }
    }
}

impl ExportManifest {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse export settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        Self::parse(&content)
    }

    /// Load `path`, or the default file if present, or built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(MANIFEST_FILE).exists() => Self::load(Path::new(MANIFEST_FILE)),
            None => Ok(Self::default()),
        }
    }

    /// Destination directory for exported models
    pub fn mesh_dir(&self) -> PathBuf {
        expand_home(&self.scene.base_dir).join(&self.scene.mesh_dir)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
