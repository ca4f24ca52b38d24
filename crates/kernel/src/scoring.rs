use glam::Vec3;
use househunt_common::EntityId;

use crate::scene::Scene;

/// A projectile whose center came within hit distance of a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub projectile: EntityId,
    pub target: EntityId,
    pub distance: f32,
}

/// Brute-force pairing of projectiles against targets by center distance.
///
/// Each projectile is consumed by its first hit and each target can be hit
/// at most once per call. Order follows the input slices.
pub fn detect_hits(
    scene: &Scene,
    projectiles: &[EntityId],
    targets: &[EntityId],
    hit_distance: f32,
) -> Vec<Hit> {
    let target_positions: Vec<(EntityId, Vec3)> = targets
        .iter()
        .filter_map(|id| Some((*id, scene.position(*id)?)))
        .collect();
    let mut taken = vec![false; target_positions.len()];
    let mut hits = Vec::new();

    for projectile in projectiles {
        let Some(p) = scene.position(*projectile) else {
            continue;
        };
        for (slot, (target, t)) in target_positions.iter().enumerate() {
            if taken[slot] {
                continue;
            }
            let distance = p.distance(*t);
            if distance < hit_distance {
                taken[slot] = true;
                hits.push(Hit {
                    projectile: *projectile,
                    target: *target,
                    distance,
                });
                break;
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;
    use househunt_common::Transform;

    fn sphere(scene: &mut Scene, at: Vec3, kind: NodeKind) -> EntityId {
        scene.spawn(Transform::from_position(at), kind)
    }

    fn target(scene: &mut Scene, at: Vec3) -> EntityId {
        sphere(scene, at, NodeKind::Target { radius: 0.5 })
    }

    fn projectile(scene: &mut Scene, at: Vec3) -> EntityId {
        sphere(
            scene,
            at,
            NodeKind::Projectile {
                radius: 0.6,
                velocity: Vec3::ZERO,
            },
        )
    }

    #[test]
    fn hit_iff_strictly_below_threshold() {
        let mut scene = Scene::new();
        let p = projectile(&mut scene, Vec3::ZERO);
        let near = target(&mut scene, Vec3::new(0.49, 0.0, 0.0));
        let edge = target(&mut scene, Vec3::new(0.0, 0.5, 0.0));

        let hits = detect_hits(&scene, &[p], &[edge, near], 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, near);
        assert_eq!(hits[0].projectile, p);
    }

    #[test]
    fn projectile_consumed_by_first_hit() {
        let mut scene = Scene::new();
        let p = projectile(&mut scene, Vec3::ZERO);
        let a = target(&mut scene, Vec3::new(0.1, 0.0, 0.0));
        let b = target(&mut scene, Vec3::new(-0.1, 0.0, 0.0));

        let hits = detect_hits(&scene, &[p], &[a, b], 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, a);
    }

    #[test]
    fn target_hit_once_per_frame() {
        let mut scene = Scene::new();
        let p1 = projectile(&mut scene, Vec3::ZERO);
        let p2 = projectile(&mut scene, Vec3::new(0.2, 0.0, 0.0));
        let t = target(&mut scene, Vec3::new(0.1, 0.0, 0.0));

        let hits = detect_hits(&scene, &[p1, p2], &[t], 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].projectile, p1);
    }

    #[test]
    fn no_targets_no_hits() {
        let mut scene = Scene::new();
        let p = projectile(&mut scene, Vec3::ZERO);
        assert!(detect_hits(&scene, &[p], &[], 0.5).is_empty());
    }

    #[test]
    fn despawned_nodes_are_ignored() {
        let mut scene = Scene::new();
        let p = projectile(&mut scene, Vec3::ZERO);
        let t = target(&mut scene, Vec3::ZERO);
        scene.despawn(t);
        assert!(detect_hits(&scene, &[p], &[t], 0.5).is_empty());
    }
}
