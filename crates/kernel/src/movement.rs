use glam::Vec3;
use househunt_common::{EntityId, Ray};
use househunt_input::HeldKeys;

use crate::camera::PlayerCamera;
use crate::collision::CollisionRegistry;
use crate::scene::Scene;

/// Result of one frame's movement attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// No displacement was requested.
    Idle,
    /// The camera moved by this displacement.
    Moved(Vec3),
    /// A collidable within clearance vetoed the move.
    Blocked { by: EntityId, distance: f32 },
}

/// Planar displacement requested by the held keys.
pub fn displacement(camera: &PlayerCamera, held: &HeldKeys, step: f32) -> Vec3 {
    let forward = camera.planar_forward();
    let left = camera.planar_left();
    let mut movement = Vec3::ZERO;
    if held.forward {
        movement += forward * step;
    }
    if held.backward {
        movement -= forward * step;
    }
    if held.left {
        movement += left * step;
    }
    if held.right {
        movement -= left * step;
    }
    movement
}

/// Move the camera unless a collidable lies within `clearance` along the
/// direction of travel.
pub fn try_move(
    camera: &mut PlayerCamera,
    held: &HeldKeys,
    step: f32,
    clearance: f32,
    registry: &CollisionRegistry,
    scene: &Scene,
) -> MoveOutcome {
    let movement = displacement(camera, held, step);
    let Some(ray) = Ray::new(camera.position, movement) else {
        return MoveOutcome::Idle;
    };

    if let Some(hit) = registry.raycast(scene, &ray, clearance) {
        tracing::debug!(
            blocker = %hit.entity.short(),
            distance = hit.distance,
            "move vetoed"
        );
        return MoveOutcome::Blocked {
            by: hit.entity,
            distance: hit.distance,
        };
    }

    camera.position += movement;
    MoveOutcome::Moved(movement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Collider, CollisionMesh};
    use crate::model::ModelMesh;
    use crate::scene::NodeKind;
    use househunt_common::{Aabb, Transform};
    use househunt_input::{InputSnapshot, MoveKey};

    fn held(keys: &[MoveKey]) -> HeldKeys {
        InputSnapshot::holding(keys).held
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    /// Registry with a thin wall whose near face sits `gap` in front of the
    /// origin along -Z.
    fn wall_ahead(gap: f32) -> (Scene, CollisionRegistry, EntityId) {
        let mut scene = Scene::new();
        let mut registry = CollisionRegistry::new();
        let mesh = ModelMesh::cuboid(
            "wall",
            Aabb::new(Vec3::new(-5.0, -5.0, -gap - 0.1), Vec3::new(5.0, 5.0, -gap)),
            [1.0; 4],
        );
        let id = scene.spawn(Transform::default(), NodeKind::ModelMesh { mesh: 0 });
        registry.insert(
            id,
            Collider::Mesh(CollisionMesh::from_model_mesh(&mesh).unwrap()),
        );
        (scene, registry, id)
    }

    #[test]
    fn keys_map_to_planar_directions() {
        let cam = PlayerCamera::new(Vec3::ZERO);
        assert!(close(displacement(&cam, &held(&[MoveKey::Forward]), 0.1), Vec3::new(0.0, 0.0, -0.1)));
        assert!(close(displacement(&cam, &held(&[MoveKey::Backward]), 0.1), Vec3::new(0.0, 0.0, 0.1)));
        assert!(close(displacement(&cam, &held(&[MoveKey::Left]), 0.1), Vec3::new(-0.1, 0.0, 0.0)));
        assert!(close(displacement(&cam, &held(&[MoveKey::Right]), 0.1), Vec3::new(0.1, 0.0, 0.0)));
    }

    #[test]
    fn opposing_keys_cancel() {
        let cam = PlayerCamera::new(Vec3::ZERO);
        let d = displacement(&cam, &held(&[MoveKey::Forward, MoveKey::Backward]), 0.1);
        assert_eq!(d, Vec3::ZERO);
    }

    #[test]
    fn pitch_keeps_motion_planar() {
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        cam.pitch = -1.2;
        let d = displacement(&cam, &held(&[MoveKey::Forward]), 0.1);
        assert_eq!(d.y, 0.0);
        assert!((d.length() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn no_keys_means_no_motion() {
        let (scene, registry, _) = wall_ahead(0.2);
        let mut cam = PlayerCamera::new(Vec3::new(1.0, 2.0, 3.0));
        let outcome = try_move(&mut cam, &HeldKeys::default(), 0.1, 0.5, &registry, &scene);
        assert_eq!(outcome, MoveOutcome::Idle);
        assert_eq!(cam.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn wall_within_clearance_vetoes() {
        let (scene, registry, wall) = wall_ahead(0.4);
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        let outcome = try_move(&mut cam, &held(&[MoveKey::Forward]), 0.1, 0.5, &registry, &scene);
        match outcome {
            MoveOutcome::Blocked { by, distance } => {
                assert_eq!(by, wall);
                assert!((distance - 0.4).abs() < 1e-5);
            }
            other => panic!("expected a veto, got {other:?}"),
        }
        assert_eq!(cam.position, Vec3::ZERO);
    }

    #[test]
    fn wall_beyond_clearance_allows_move() {
        let (scene, registry, _) = wall_ahead(0.6);
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        let outcome = try_move(&mut cam, &held(&[MoveKey::Forward]), 0.1, 0.5, &registry, &scene);
        assert!(matches!(outcome, MoveOutcome::Moved(_)));
        assert!(close(cam.position, Vec3::new(0.0, 0.0, -0.1)));
    }

    #[test]
    fn moving_away_from_wall_is_allowed() {
        let (scene, registry, _) = wall_ahead(0.1);
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        let outcome = try_move(&mut cam, &held(&[MoveKey::Backward]), 0.1, 0.5, &registry, &scene);
        assert!(matches!(outcome, MoveOutcome::Moved(_)));
        assert!(close(cam.position, Vec3::new(0.0, 0.0, 0.1)));
    }

    #[test]
    fn empty_registry_never_blocks() {
        let scene = Scene::new();
        let registry = CollisionRegistry::new();
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        for _ in 0..10 {
            try_move(&mut cam, &held(&[MoveKey::Right]), 0.1, 0.5, &registry, &scene);
        }
        assert!(close(cam.position, Vec3::new(1.0, 0.0, 0.0)));
    }
}
