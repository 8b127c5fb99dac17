//! Mesh structures and panel operations

pub mod generators;
pub mod panel;
pub mod trimesh;

pub use generators::{flat_plate_wing, flat_sheet};
pub use panel::{Panel, SurfacePosition};
pub use trimesh::TriMesh;
