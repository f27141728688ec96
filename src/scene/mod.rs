// scene/mod.rs

pub mod camera;
pub mod components;
pub mod graph;
pub mod transform;

pub use camera::{Camera, Projection};
pub use components::{Children, LocalTransform, NodeId, Parent};
pub use graph::{DrawableGroupId, SceneGraph};
pub use transform::Transform;
