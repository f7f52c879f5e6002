//! Error types for object export

use std::io;
use std::path::PathBuf;

/// Rejection by the pre-processing validation gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("The mesh contains non triangles (face {face} has {arity} vertices)")]
    NonTriangleFace { face: usize, arity: usize },

    #[error("face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        face: usize,
        vertex: u32,
        vertex_count: usize,
    },

    #[error("vertex {vertex} has a non-finite position or normal")]
    NonFiniteVertex { vertex: usize },

    #[error("Invalid object name {0:?}: must be a plain file name")]
    InvalidObjectName(String),
}

/// Failure of a single export invocation.
///
/// Every variant aborts the whole export; nothing is retried and no partial
/// document is left at the destination.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Malformed topology: edge ({0}, {1}) is shared by {2} triangles")]
    MalformedTopology(u32, u32, usize),

    #[error("Open topology: triangle {triangle} has a boundary edge, but closed topology is required")]
    OpenTopology { triangle: usize },

    #[error("Mesh directory doesn't exist: {0:?}")]
    DirectoryNotFound(PathBuf),

    #[error("Vertex {vertex} has {count} bone influences, maximum is 4")]
    TooManyInfluences { vertex: usize, count: usize },

    #[error("Skeleton has {0} deforming bones, maximum is 256")]
    TooManyBones(usize),

    #[error("Invalid skeleton: {0}")]
    InvalidSkeleton(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Failed to write document: {0}")]
    Serialization(#[from] io::Error),
}

/// Severity reported back to the invoking caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Info,
    Error,
}

impl ExportError {
    /// Status and human-readable message for the caller's report.
    pub fn status(&self) -> (ExportStatus, String) {
        (ExportStatus::Error, self.to_string())
    }
}
