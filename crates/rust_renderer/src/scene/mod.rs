//! Scene objects: transforms and the renderable objects that carry them

pub mod renderable_object;
pub mod transform;

pub use renderable_object::RenderableObject;
pub use transform::Transform;
