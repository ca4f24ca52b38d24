use glam::Vec3;
use househunt_common::{EntityId, Transform};

use crate::camera::PlayerCamera;
use crate::scene::{NodeKind, Scene};

/// Spawn a projectile at the camera, moving along its facing direction.
pub fn fire(scene: &mut Scene, camera: &PlayerCamera, speed: f32, radius: f32) -> EntityId {
    let velocity = camera.forward() * speed;
    scene.spawn(
        Transform::from_position(camera.position),
        NodeKind::Projectile { radius, velocity },
    )
}

/// Advance every listed projectile by one frame of its velocity.
pub fn integrate(scene: &mut Scene, projectiles: &[EntityId]) {
    for id in projectiles {
        let Some(node) = scene.get(*id) else {
            continue;
        };
        if let NodeKind::Projectile { velocity, .. } = node.kind {
            let next = node.position() + velocity;
            scene.set_position(*id, next);
        }
    }
}

/// Velocity of a projectile node, if `id` is one.
pub fn velocity(scene: &Scene, id: EntityId) -> Option<Vec3> {
    match scene.get(id)?.kind {
        NodeKind::Projectile { velocity, .. } => Some(velocity),
        _ => None,
    }
}
