//! Mesh conversion (snapshot -> flat arrays + adjacency)

mod flatten;
mod topology;
mod types;
mod validate;

// Re-export public API
pub use flatten::flatten_geometry;
pub use topology::{build_topology, require_closed, EdgeKey, BOUNDARY};
pub use types::{FlatGeometry, Topology};
pub use validate::{has_triangles_only, validate_mesh};
