//! Flat scene registry.
//!
//! The scene is a bag of [`SceneNode`]s: one distinguished text node and any
//! number of anonymous bulk nodes. Every node is tagged with its [`NodeKind`]
//! when it is created; traversal filters on that tag. Membership is
//! append-only, there is no removal path.

use std::sync::Arc;

use crate::data_structures::{geometry::Geometry, instance::Instance, material::MatcapMaterial};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The extruded text, addressed directly through a [`TextHandle`].
    Text,
    /// Generated instances, only reachable through traversal.
    Bulk,
}

/// A renderable: shared geometry and material plus an owned transform.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub geometry: Arc<Geometry>,
    pub material: Arc<MatcapMaterial>,
    pub transform: Instance,
}

impl SceneNode {
    pub fn new(
        kind: NodeKind,
        geometry: Arc<Geometry>,
        material: Arc<MatcapMaterial>,
        transform: Instance,
    ) -> Self {
        Self {
            kind,
            geometry,
            material,
            transform,
        }
    }
}

/// Named reference to the text node. Only [`SceneRegistry::add_text`] hands these out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextHandle(usize);

#[derive(Debug, Default)]
pub struct SceneRegistry {
    nodes: Vec<SceneNode>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unconditionally. Returns the number of nodes afterwards.
    pub fn add(&mut self, node: SceneNode) -> usize {
        self.nodes.push(node);
        self.nodes.len()
    }

    pub fn add_text(&mut self, mut node: SceneNode) -> TextHandle {
        node.kind = NodeKind::Text;
        self.nodes.push(node);
        TextHandle(self.nodes.len() - 1)
    }

    pub fn text(&self, handle: TextHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0)
    }

    pub fn text_mut(&mut self, handle: TextHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle.0)
    }

    /// Visit every node tagged `kind`. Order is not part of the contract.
    pub fn for_each<F>(&self, kind: NodeKind, mut visitor: F)
    where
        F: FnMut(&SceneNode),
    {
        self.nodes
            .iter()
            .filter(|node| node.kind == kind)
            .for_each(|node| visitor(node));
    }

    pub fn for_each_mut<F>(&mut self, kind: NodeKind, mut visitor: F)
    where
        F: FnMut(&mut SceneNode),
    {
        self.nodes
            .iter_mut()
            .filter(|node| node.kind == kind)
            .for_each(|node| visitor(node));
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|node| node.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
