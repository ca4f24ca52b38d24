use glam::Vec3;
use househunt_common::{EntityId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a scene node represents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A mesh of the loaded model, by index into `Model::meshes`.
    ModelMesh { mesh: usize },
    /// A target sphere waiting to be shot.
    Target { radius: f32 },
    /// A fired sphere travelling at constant velocity.
    Projectile { radius: f32, velocity: Vec3 },
}

/// A renderable entity owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub transform: Transform,
    pub kind: NodeKind,
}

impl Node {
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Sphere radius for targets and projectiles.
    pub fn radius(&self) -> Option<f32> {
        match self.kind {
            NodeKind::Target { radius } | NodeKind::Projectile { radius, .. } => Some(radius),
            NodeKind::ModelMesh { .. } => None,
        }
    }
}

/// Flat scene graph keyed by id.
///
/// BTreeMap keeps iteration order stable for a given set of ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    nodes: BTreeMap<EntityId, Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, transform: Transform, kind: NodeKind) -> EntityId {
        let id = EntityId::new();
        self.nodes.insert(id, Node { transform, kind });
        id
    }

    /// Remove a node. Returns it if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.nodes.get(&id).map(Node::position)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.transform.position = position;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &BTreeMap<EntityId, Node> {
        &self.nodes
    }

    /// Every node of the given shape, e.g. all targets.
    pub fn iter_kind(
        &self,
        matches: impl Fn(&NodeKind) -> bool,
    ) -> impl Iterator<Item = (EntityId, &Node)> {
        self.nodes
            .iter()
            .filter(move |(_, node)| matches(&node.kind))
            .map(|(id, node)| (*id, node))
    }
}
