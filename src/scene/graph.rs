use glam::Mat4;
use hecs::World;

use super::components::{Children, LocalTransform, NodeId, Parent};
use super::{Camera, Transform};
use crate::gfx::{DrawContext, Drawable, NodeInfo, ID_UNDEFINED};
use crate::renderer::DrawTarget;
use crate::resource::ResourceKey;

/// Index of a drawable group inside its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableGroupId(usize);

#[derive(Default)]
struct DrawableGroup {
    drawables: Vec<Box<dyn Drawable>>,
}

/// Node hierarchy stored in a hecs world, plus drawable groups that render
/// the nodes they are attached to.
///
/// Drawables hold non-thread-safe cache handles, so they live in the groups
/// rather than as components.
#[derive(Default)]
pub struct SceneGraph {
    world: World,
    groups: Vec<DrawableGroup>,
}

fn absolute_transformation(world: &World, entity: hecs::Entity) -> Option<Mat4> {
    let mut matrix = world.get::<&LocalTransform>(entity).ok()?.0.matrix();
    let mut current = entity;
    while let Some(parent) = world.get::<&Parent>(current).ok().map(|p| p.0) {
        let parent_local = match world.get::<&LocalTransform>(parent) {
            Ok(local) => local.0.matrix(),
            Err(_) => {
                log::warn!("Parent {:?} of {:?} has no transform", parent, current);
                break;
            }
        };
        matrix = parent_local * matrix;
        current = parent;
    }
    Some(matrix)
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a node under `parent`, or as a root.
    pub fn add_node(&mut self, parent: Option<hecs::Entity>, transform: Transform) -> hecs::Entity {
        let entity = self
            .world
            .spawn((LocalTransform(transform), NodeId(ID_UNDEFINED)));

        let Some(parent) = parent else {
            return entity;
        };
        if !self.world.contains(parent) {
            log::warn!("Parent {:?} does not exist, {:?} stays a root", parent, entity);
            return entity;
        }

        if let Err(e) = self.world.insert_one(entity, Parent(parent)) {
            log::error!("Failed to parent {:?}: {:?}", entity, e);
            return entity;
        }
        let has_children = match self.world.get::<&mut Children>(parent) {
            Ok(mut children) => {
                children.0.push(entity);
                true
            }
            Err(_) => false,
        };
        if !has_children {
            if let Err(e) = self.world.insert_one(parent, Children(vec![entity])) {
                log::error!("Failed to record child of {:?}: {:?}", parent, e);
            }
        }
        entity
    }

    pub fn contains_node(&self, entity: hecs::Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn node_count(&self) -> usize {
        self.world.len() as usize
    }

    pub fn set_node_id(&mut self, entity: hecs::Entity, id: i32) -> bool {
        match self.world.get::<&mut NodeId>(entity) {
            Ok(mut node_id) => {
                node_id.0 = id;
                true
            }
            Err(_) => false,
        }
    }

    pub fn node_id(&self, entity: hecs::Entity) -> Option<i32> {
        self.world.get::<&NodeId>(entity).ok().map(|id| id.0)
    }

    pub fn set_transform(&mut self, entity: hecs::Entity, transform: Transform) -> bool {
        match self.world.get::<&mut LocalTransform>(entity) {
            Ok(mut local) => {
                local.0 = transform;
                true
            }
            Err(_) => false,
        }
    }

    pub fn transform(&self, entity: hecs::Entity) -> Option<Transform> {
        self.world.get::<&LocalTransform>(entity).ok().map(|t| t.0)
    }

    /// Object-local to world space, composed through all ancestors.
    pub fn absolute_transformation(&self, entity: hecs::Entity) -> Option<Mat4> {
        absolute_transformation(&self.world, entity)
    }

    pub fn children(&self, entity: hecs::Entity) -> Vec<hecs::Entity> {
        self.world
            .get::<&Children>(entity)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    /// Despawn `entity` with its whole subtree and drop every drawable
    /// attached to a removed node. Returns the number of removed nodes.
    pub fn remove_node(&mut self, entity: hecs::Entity) -> usize {
        if !self.world.contains(entity) {
            return 0;
        }

        if let Some(parent) = self.world.get::<&Parent>(entity).ok().map(|p| p.0) {
            if let Ok(mut siblings) = self.world.get::<&mut Children>(parent) {
                siblings.0.retain(|&child| child != entity);
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            if let Ok(children) = self.world.get::<&Children>(current) {
                stack.extend(children.0.iter().copied());
            }
            removed.push(current);
        }
        for &node in &removed {
            if let Err(e) = self.world.despawn(node) {
                log::warn!("Failed to despawn {:?}: {:?}", node, e);
            }
        }

        let mut dropped = 0;
        for group in &mut self.groups {
            let before = group.drawables.len();
            group
                .drawables
                .retain(|drawable| !removed.contains(&drawable.node()));
            dropped += before - group.drawables.len();
        }

        log::debug!(
            "Removed {} nodes and {} drawables under {:?}",
            removed.len(),
            dropped,
            entity
        );
        removed.len()
    }

    pub fn create_group(&mut self) -> DrawableGroupId {
        self.groups.push(DrawableGroup::default());
        DrawableGroupId(self.groups.len() - 1)
    }

    /// Add `drawable` to `group`. Refused when the group or the drawable's
    /// node does not exist.
    pub fn attach(&mut self, group: DrawableGroupId, drawable: Box<dyn Drawable>) -> bool {
        if !self.world.contains(drawable.node()) {
            log::warn!("Cannot attach a drawable to missing node {:?}", drawable.node());
            return false;
        }
        let Some(group) = self.groups.get_mut(group.0) else {
            log::warn!("Cannot attach a drawable to unknown group {:?}", group);
            return false;
        };
        group.drawables.push(drawable);
        true
    }

    pub fn drawable_count(&self, group: DrawableGroupId) -> usize {
        self.groups
            .get(group.0)
            .map_or(0, |group| group.drawables.len())
    }

    /// Draw every drawable of `group` in attachment order. Each gets its
    /// node's absolute transformation premultiplied by the camera matrix.
    /// Returns the number of drawables visited.
    pub fn draw_group(
        &mut self,
        group: DrawableGroupId,
        camera: &Camera,
        target: &mut dyn DrawTarget,
    ) -> usize {
        let Self { world, groups } = self;
        let Some(group) = groups.get_mut(group.0) else {
            return 0;
        };

        let camera_matrix = camera.camera_matrix();
        let mut visited = 0;
        for drawable in &mut group.drawables {
            let entity = drawable.node();
            let Some(absolute) = absolute_transformation(world, entity) else {
                log::warn!("Drawable node {:?} vanished, skipping", entity);
                continue;
            };
            let id = world
                .get::<&NodeId>(entity)
                .map_or(ID_UNDEFINED, |node_id| node_id.0);

            let transformation = camera_matrix * absolute;
            let mut ctx = DrawContext {
                node: NodeInfo {
                    entity,
                    id,
                    absolute_transformation: absolute,
                },
                target: &mut *target,
            };
            drawable.draw(&transformation, camera, &mut ctx);
            visited += 1;
        }
        visited
    }

    /// Point every drawable of `group` at another light setup.
    pub fn set_light_setup(&mut self, group: DrawableGroupId, light_setup: &ResourceKey) {
        let Some(group) = self.groups.get_mut(group.0) else {
            return;
        };
        log::debug!(
            "Switching {} drawables to light setup '{}'",
            group.drawables.len(),
            light_setup
        );
        for drawable in &mut group.drawables {
            drawable.set_light_setup(light_setup);
        }
    }
}
