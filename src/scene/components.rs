use super::Transform;

/// Transformation relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform(pub Transform);

/// Parent entity reference
#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

/// List of children entities
#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<hecs::Entity>);

/// Semantic id of a node, written to the object-id attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub i32);
