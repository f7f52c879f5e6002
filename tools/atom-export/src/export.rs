//! Object export (scene object -> .m3d file)

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{ExportError, ExportStatus, ValidationError};
use crate::formats::{write_m3d, Document, M3D_EXT};
use crate::manifest::ExportSettings;
use crate::mesh::{build_topology, flatten_geometry, require_closed, validate_mesh};
use crate::scene::{ObjectSnapshot, SceneSource};
use crate::skeleton::build_skeleton;
use crate::skinning::pack_skinning;

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Exported (deforming) bones, 0 without skeleton
    pub bone_count: usize,
    pub elapsed: Duration,
}

impl ExportSummary {
    pub fn status(&self) -> (ExportStatus, String) {
        (ExportStatus::Info, "OK".to_string())
    }
}

/// Owned clone of the object snapshot, held for one export.
///
/// The source scene is never mutated. Dropping the copy only releases the
/// clone and logs it; there is nothing else to clean up.
struct WorkingCopy {
    object: ObjectSnapshot,
}

impl WorkingCopy {
    fn acquire(scene: &(impl SceneSource + ?Sized), name: &str) -> Result<Self, ExportError> {
        let object = scene.snapshot(name)?;
        tracing::debug!("Acquired working copy of '{}'", object.name);
        Ok(Self { object })
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        tracing::debug!("Discarded working copy of '{}'", self.object.name);
    }
}

/// Path of the exported model for an object.
///
/// The object name must be a plain file name so the model always lands
/// directly inside `dest_dir`.
pub fn output_path(dest_dir: &Path, object: &str) -> Result<PathBuf, ValidationError> {
    let plain = !object.is_empty()
        && object != "."
        && object != ".."
        && !object.contains(['/', '\\'])
        && Path::new(object).file_name() == Some(OsStr::new(object));
    if !plain {
        return Err(ValidationError::InvalidObjectName(object.to_string()));
    }

    Ok(dest_dir.join(format!("{}.{}", object, M3D_EXT)))
}

/// Convert an object snapshot to an in-memory document.
pub fn convert_object(
    object: &ObjectSnapshot,
    settings: &ExportSettings,
) -> Result<Document, ExportError> {
    let mesh = &object.mesh;
    validate_mesh(mesh)?;

    let geometry = flatten_geometry(mesh);
    let topology = build_topology(mesh)?;
    if settings.closed_topology {
        require_closed(&topology)?;
    }

    let rig = match (&object.armature, settings.bones) {
        (Some(armature), true) => {
            let skeleton = build_skeleton(armature)?;
            let skinning = pack_skinning(mesh, &skeleton.table)?;
            Some((skeleton, skinning))
        }
        (Some(_), false) => {
            tracing::debug!("Skeleton export disabled for '{}'", object.name);
            None
        }
        (None, _) => None,
    };

    Ok(Document::assemble(geometry, topology, rig, settings.normals))
}

/// Export one object to `<dest_dir>/<object>.m3d`.
///
/// The destination directory must already exist. The document is written to
/// a temporary file and renamed over any existing model, so a failed export
/// never leaves a partial file behind.
pub fn export_object(
    scene: &(impl SceneSource + ?Sized),
    object: &str,
    dest_dir: &Path,
    settings: &ExportSettings,
) -> Result<ExportSummary, ExportError> {
    let start = Instant::now();

    if !dest_dir.is_dir() {
        return Err(ExportError::DirectoryNotFound(dest_dir.to_path_buf()));
    }

    let copy = WorkingCopy::acquire(scene, object)?;
    let path = output_path(dest_dir, &copy.object.name)?;
    let document = convert_object(&copy.object, settings)?;

    write_atomic(&path, &document, settings.compact)?;

    let summary = ExportSummary {
        path,
        vertex_count: copy.object.mesh.vertex_count(),
        triangle_count: copy.object.mesh.face_count(),
        bone_count: document.skeleton().map_or(0, |s| s.bones.len()),
        elapsed: start.elapsed(),
    };

    tracing::info!(
        "Exported '{}': {} vertices, {} triangles, {} bones in {:.3}s",
        copy.object.name,
        summary.vertex_count,
        summary.triangle_count,
        summary.bone_count,
        summary.elapsed.as_secs_f64()
    );

    Ok(summary)
}

/// Write to `<path>.tmp`, sync, then rename into place.
fn write_atomic(path: &Path, document: &Document, compact: bool) -> Result<(), ExportError> {
    let tmp_path = path.with_extension(format!("{}.tmp", M3D_EXT));

    let written = (|| {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        write_m3d(&mut writer, document, compact)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        #[cfg(windows)]
        {
            if path.exists() {
                // Windows rename fails if destination exists.
                fs::remove_file(path)?;
            }
        }

        fs::rename(&tmp_path, path)
    })();

    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(ExportError::Serialization(err));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Face, MeshSnapshot, SceneFile, Vertex};
    use tempfile::tempdir;

    fn triangle_scene(name: &str) -> SceneFile {
        let n = [0.0, 0.0, 1.0];
        SceneFile {
            objects: vec![ObjectSnapshot {
                name: name.to_string(),
                mesh: MeshSnapshot {
                    vertices: vec![
                        Vertex::new([0.0, 0.0, 0.0], n),
                        Vertex::new([1.0, 0.0, 0.0], n),
                        Vertex::new([0.0, 1.0, 0.0], n),
                    ],
                    faces: vec![Face::triangle(0, 1, 2)],
                },
                armature: None,
            }],
        }
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/data/mesh"), "Cube"),
            Ok(PathBuf::from("/data/mesh/Cube.m3d"))
        );
        assert_eq!(
            output_path(Path::new("/data/mesh"), "Body.001"),
            Ok(PathBuf::from("/data/mesh/Body.001.m3d"))
        );
    }

    #[test]
    fn test_output_path_rejects_non_file_names() {
        for name in ["", ".", "..", "../escaped", "sub/Cube", "sub\\Cube", "/abs"] {
            assert_eq!(
                output_path(Path::new("/data/mesh"), name),
                Err(ValidationError::InvalidObjectName(name.to_string())),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_escaping_object_name_writes_nothing() {
        let root = tempdir().expect("Failed to create temp dir");
        let dest = root.path().join("mesh");
        fs::create_dir(&dest).unwrap();

        let err = export_object(
            &triangle_scene("../escaped"),
            "../escaped",
            &dest,
            &ExportSettings::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Validation(ValidationError::InvalidObjectName(_))
        ));
        assert!(!root.path().join("escaped.m3d").exists());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        // A non-empty directory where the model should go makes the rename fail
        let blocker = dir.path().join("Tri.m3d");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        let err = export_object(&triangle_scene("Tri"), "Tri", dir.path(), &ExportSettings::default())
            .unwrap_err();

        assert!(matches!(err, ExportError::Serialization(_)), "got {:?}", err);
        assert!(!dir.path().join("Tri.m3d.tmp").exists());
        assert!(blocker.join("keep").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_overwrites_and_leaves_no_temp() {
        let dir = tempdir().expect("Failed to create temp dir");
        let scene = triangle_scene("Tri");
        let target = dir.path().join("Tri.m3d");
        fs::write(&target, "stale").unwrap();

        let summary = export_object(&scene, "Tri", dir.path(), &ExportSettings::default()).unwrap();

        assert_eq!(summary.path, target);
        assert_eq!(summary.status(), (ExportStatus::Info, "OK".to_string()));
        let content = fs::read_to_string(&target).unwrap();
        assert!(content.starts_with('{'));
        assert!(!dir.path().join("Tri.m3d.tmp").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_open_mesh_rejected_when_closed_required() {
        let dir = tempdir().expect("Failed to create temp dir");
        let settings = ExportSettings {
            closed_topology: true,
            ..ExportSettings::default()
        };
        let err = export_object(&triangle_scene("Tri"), "Tri", dir.path(), &settings).unwrap_err();
        assert!(matches!(err, ExportError::OpenTopology { triangle: 0 }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_checked_first() {
        let dir = tempdir().expect("Failed to create temp dir");
        let missing = dir.path().join("mesh");
        let err = export_object(&SceneFile::default(), "Ghost", &missing, &ExportSettings::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::DirectoryNotFound(p) if p == missing));
        assert!(!missing.exists());
    }

    #[test]
    fn test_unknown_object() {
        let dir = tempdir().expect("Failed to create temp dir");
        let err = export_object(&triangle_scene("Tri"), "Cube", dir.path(), &ExportSettings::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::ObjectNotFound(_)));
    }
}
