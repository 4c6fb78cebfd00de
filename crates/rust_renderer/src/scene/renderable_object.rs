//! Renderable object representation for the scene
//!
//! A mesh placed in the world with a transform and a flat color. Meshes are
//! shared through `Rc`, so any number of objects can draw the same GPU buffers.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::math::Vec3;
use crate::render::mesh_resource::MeshResource;
use crate::scene::transform::Transform;

static NEXT_OBJECT_ID: AtomicU32 = AtomicU32::new(0);

/// Object drawn by the render systems
///
/// Not `Clone`: every object gets a unique id at creation.
pub struct RenderableObject {
    id: u32,

    /// Placement in world space
    pub transform: Transform,

    /// Flat color multiplied into the vertex colors
    pub color: Vec3,

    /// Shared GPU mesh
    pub mesh: Rc<MeshResource>,
}

impl RenderableObject {
    /// Create an object with an identity transform and white color
    pub fn new(mesh: Rc<MeshResource>) -> Self {
        Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            transform: Transform::default(),
            color: Vec3::new(1.0, 1.0, 1.0),
            mesh,
        }
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the color
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Unique id, assigned in creation order
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Debug for RenderableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderableObject")
            .field("id", &self.id)
            .field("transform", &self.transform)
            .field("color", &self.color)
            .field("vertex_count", &self.mesh.vertex_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives::mesh::MeshBuilder;
    use crate::render::testing::RecordingDevice;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let device = RecordingDevice::new();
        let mesh = Rc::new(MeshResource::new(device.clone(), &MeshBuilder::cube(Vec3::zeros())).unwrap());

        let a = RenderableObject::new(Rc::clone(&mesh));
        let b = RenderableObject::new(Rc::clone(&mesh));
        assert!(b.id() > a.id());
        assert_eq!(Rc::strong_count(&mesh), 3);
    }

    #[test]
    fn test_mesh_outlives_first_holder() {
        let device = RecordingDevice::new();
        let mesh = Rc::new(MeshResource::new(device.clone(), &MeshBuilder::cube(Vec3::zeros())).unwrap());
        let a = RenderableObject::new(Rc::clone(&mesh));
        let b = RenderableObject::new(mesh);

        drop(a);
        assert_eq!(device.live_buffers().len(), 2);
        assert_eq!(b.mesh.index_count(), 36);

        drop(b);
        assert!(device.live_buffers().is_empty());
    }
}
