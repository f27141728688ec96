use glam::Mat4;

use crate::renderer::DrawTarget;
use crate::resource::ResourceKey;
use crate::scene::Camera;

/// Node id used when a node was never given one.
pub const ID_UNDEFINED: i32 = -1;

/// What a drawable may know about the node that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeInfo {
    pub entity: hecs::Entity,
    pub id: i32,
    /// Object-local to world space.
    pub absolute_transformation: Mat4,
}

/// Per-draw state handed to a drawable by the scene traversal.
pub struct DrawContext<'a> {
    pub node: NodeInfo,
    pub target: &'a mut dyn DrawTarget,
}

/// Anything the scene graph can render.
pub trait Drawable {
    /// Render with `transformation` (object-local to camera space) as seen
    /// through `camera`.
    fn draw(&mut self, transformation: &Mat4, camera: &Camera, ctx: &mut DrawContext<'_>);

    /// Switch to another light setup. Drawables that ignore lighting keep
    /// the default no-op.
    fn set_light_setup(&mut self, _light_setup: &ResourceKey) {}

    fn node(&self) -> hecs::Entity;
}
