//! Backend-facing rendering primitives: camera and mesh data

pub mod camera;
pub mod mesh;

pub use camera::Camera;
pub use mesh::{MeshBuilder, Vertex};
