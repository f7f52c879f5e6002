//! atom-export library
//!
//! Converts editor mesh snapshots (triangulated, world-transformed, with an
//! optional armature) into engine-ready .m3d model documents.

pub mod error;
pub mod export;
pub mod formats;
pub mod manifest;
pub mod mesh;
pub mod scene;
pub mod skeleton;
pub mod skinning;

// Re-export key types for object export
pub use error::{ExportError, ExportStatus, ValidationError};
pub use export::{convert_object, export_object, output_path, ExportSummary};
pub use formats::{read_m3d, write_m3d, Document, ElementArray, M3D_EXT};
pub use manifest::{ExportManifest, ExportSettings};
pub use scene::{ObjectSnapshot, SceneFile, SceneSource};
