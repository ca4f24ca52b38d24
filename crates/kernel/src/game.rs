use glam::Vec3;
use househunt_common::{Aabb, EntityId, Transform};
use househunt_input::InputSnapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::camera::PlayerCamera;
use crate::collision::{Collider, CollisionMesh, CollisionRegistry};
use crate::config::{GameConfig, TargetHitPolicy};
use crate::hud::Hud;
use crate::model::Model;
use crate::movement::{self, MoveOutcome};
use crate::scene::{NodeKind, Scene};
use crate::{scoring, shooting};

/// Whole-game state machine. `Won` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Loading,
    Playing,
    Won,
}

/// An event record produced by every game mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A model was installed and its meshes registered as collidable.
    ModelLoaded {
        meshes: usize,
        triangles: usize,
        bounds: Aabb,
    },
    /// The model could not be loaded. The game keeps running without targets.
    LoadFailed { reason: String },
    /// A target sphere was placed inside the model bounds.
    TargetSpawned { id: EntityId, position: Vec3 },
    /// A projectile left the camera with the given velocity.
    ProjectileFired {
        id: EntityId,
        origin: Vec3,
        velocity: Vec3,
    },
    /// A collidable within clearance vetoed this frame's movement.
    MoveBlocked { by: EntityId, distance: f32 },
    /// A projectile hit a target. Carries the score after the hit.
    TargetHit {
        projectile: EntityId,
        target: EntityId,
        score: u32,
    },
    /// A hit target was moved to a new position instead of being removed.
    TargetRespawned { id: EntityId, position: Vec3 },
    /// The win score was reached. Emitted once.
    Won { score: u32 },
}

/// What happened during one [`Game::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub movement: MoveOutcome,
    pub fired: u32,
    pub hits: u32,
}

/// Read-only snapshot of the game for tooling and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub tick: u64,
    pub phase: GamePhase,
    pub score: u32,
    pub targets: usize,
    pub projectiles: usize,
    pub collidables: usize,
    pub camera: Vec3,
}

/// The single controller that owns all game state.
///
/// Per tick: look → fire → movement → hit resolution → projectile
/// integration. Drawing happens outside, from the read accessors.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    phase: GamePhase,
    camera: PlayerCamera,
    scene: Scene,
    model: Option<Model>,
    model_bounds: Option<Aabb>,
    registry: CollisionRegistry,
    targets: Vec<EntityId>,
    projectiles: Vec<EntityId>,
    score: u32,
    hud: Hud,
    rng: StdRng,
    tick: u64,
    event_log: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            camera: PlayerCamera::new(config.start_position),
            config,
            phase: GamePhase::Loading,
            scene: Scene::new(),
            model: None,
            model_bounds: None,
            registry: CollisionRegistry::new(),
            targets: Vec::new(),
            projectiles: Vec::new(),
            score: 0,
            hud: Hud::new(),
            rng,
            tick: 0,
            event_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn camera(&self) -> &PlayerCamera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn model_bounds(&self) -> Option<Aabb> {
        self.model_bounds
    }

    pub fn registry(&self) -> &CollisionRegistry {
        &self.registry
    }

    /// Live targets in spawn order.
    pub fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    /// Live projectiles in fire order.
    pub fn projectiles(&self) -> &[EntityId] {
        &self.projectiles
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.event_log
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            tick: self.tick,
            phase: self.phase,
            score: self.score,
            targets: self.targets.len(),
            projectiles: self.projectiles.len(),
            collidables: self.registry.len(),
            camera: self.camera.position,
        }
    }

    /// Install a loaded model: every mesh becomes a collidable scene node,
    /// then the configured number of targets is scattered inside its bounds.
    /// Returns the number of targets spawned.
    pub fn load_model(&mut self, model: Model) -> usize {
        if self.phase != GamePhase::Loading {
            tracing::warn!(model = %model.name, "model already loaded, ignoring");
            return 0;
        }
        let Some(bounds) = model.bounds() else {
            self.load_failed(format!("model {} has no geometry", model.name));
            return 0;
        };

        for (index, mesh) in model.meshes.iter().enumerate() {
            let id = self.scene.spawn(Transform::default(), NodeKind::ModelMesh { mesh: index });
            match CollisionMesh::from_model_mesh(mesh) {
                Some(collider) => self.registry.insert(id, Collider::Mesh(collider)),
                None => tracing::debug!(mesh = %mesh.name, "mesh has no triangles"),
            }
        }

        tracing::info!(
            model = %model.name,
            meshes = model.meshes.len(),
            triangles = model.triangle_count(),
            "model loaded"
        );
        self.event_log.push(GameEvent::ModelLoaded {
            meshes: model.meshes.len(),
            triangles: model.triangle_count(),
            bounds,
        });
        self.model_bounds = Some(bounds);
        self.model = Some(model);
        self.phase = GamePhase::Playing;

        let spawned = self.spawn_targets(self.config.target_count).len();
        tracing::info!(targets = spawned, "targets spawned");
        spawned
    }

    /// Record a failed load. The game keeps running with nothing to hit.
    pub fn load_failed(&mut self, reason: impl Display) {
        let reason = reason.to_string();
        tracing::error!("failed to load model: {reason}");
        self.event_log.push(GameEvent::LoadFailed { reason });
    }

    /// Scatter `count` targets uniformly inside the model bounds. Does
    /// nothing before a model is loaded.
    pub fn spawn_targets(&mut self, count: usize) -> Vec<EntityId> {
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(position) = self.random_point_in_model() else {
                break;
            };
            let id = self.scene.spawn(
                Transform::from_position(position),
                NodeKind::Target {
                    radius: self.config.target_radius,
                },
            );
            self.registry.insert(
                id,
                Collider::Sphere {
                    radius: self.config.target_radius,
                },
            );
            self.targets.push(id);
            self.event_log.push(GameEvent::TargetSpawned { id, position });
            spawned.push(id);
        }
        spawned
    }

    /// Spawn a projectile at the camera along its facing direction.
    pub fn fire(&mut self) -> EntityId {
        let id = shooting::fire(
            &mut self.scene,
            &self.camera,
            self.config.projectile_speed,
            self.config.projectile_radius,
        );
        let velocity = shooting::velocity(&self.scene, id).unwrap_or(Vec3::ZERO);
        self.projectiles.push(id);
        self.event_log.push(GameEvent::ProjectileFired {
            id,
            origin: self.camera.position,
            velocity,
        });
        id
    }

    /// Teleport a node, e.g. a target placed by a script.
    pub fn set_node_position(&mut self, id: EntityId, position: Vec3) -> bool {
        self.scene.set_position(id, position)
    }

    /// Run one frame of game logic against a fresh input snapshot.
    pub fn tick(&mut self, input: &InputSnapshot) -> FrameReport {
        let _span = tracing::debug_span!("tick", tick = self.tick).entered();

        self.camera.yaw = input.yaw;
        self.camera.pitch = input.pitch;

        for _ in 0..input.fire_requests {
            self.fire();
        }

        let movement = movement::try_move(
            &mut self.camera,
            &input.held,
            self.config.move_step,
            self.config.clearance,
            &self.registry,
            &self.scene,
        );
        if let MoveOutcome::Blocked { by, distance } = movement {
            self.event_log.push(GameEvent::MoveBlocked { by, distance });
        }

        let hits = self.resolve_hits();
        self.integrate_projectiles();
        self.tick += 1;

        FrameReport {
            movement,
            fired: input.fire_requests,
            hits,
        }
    }

    /// Score every projectile/target pair closer than the hit distance.
    /// Returns the number of hits that counted.
    pub fn resolve_hits(&mut self) -> u32 {
        if self.targets.is_empty() || self.projectiles.is_empty() {
            return 0;
        }
        let hits = scoring::detect_hits(
            &self.scene,
            &self.projectiles,
            &self.targets,
            self.config.hit_distance,
        );

        let mut counted = 0;
        for hit in hits {
            if self.phase == GamePhase::Won {
                break;
            }
            self.remove_projectile(hit.projectile);
            self.score += 1;
            counted += 1;
            self.hud.set_score(self.score);
            tracing::info!(
                target = %hit.target.short(),
                score = self.score,
                "target hit"
            );
            self.event_log.push(GameEvent::TargetHit {
                projectile: hit.projectile,
                target: hit.target,
                score: self.score,
            });

            // The winning hit always removes its target.
            let won = self.score >= self.config.win_score;
            match self.config.target_hit_policy {
                TargetHitPolicy::Respawn if !won => self.respawn_target(hit.target),
                _ => self.remove_target(hit.target),
            }
            if won {
                self.declare_win();
            }
        }
        counted
    }

    /// Advance every live projectile by its velocity.
    pub fn integrate_projectiles(&mut self) {
        shooting::integrate(&mut self.scene, &self.projectiles);
    }

    fn declare_win(&mut self) {
        self.phase = GamePhase::Won;
        self.hud.show_win();
        for id in std::mem::take(&mut self.projectiles) {
            self.scene.despawn(id);
        }
        for id in std::mem::take(&mut self.targets) {
            self.scene.despawn(id);
        }
        // Nothing blocks the camera once the game is won, walls included.
        self.registry.clear();
        tracing::info!(score = self.score, "win threshold reached");
        self.event_log.push(GameEvent::Won { score: self.score });
    }

    fn remove_projectile(&mut self, id: EntityId) {
        self.projectiles.retain(|p| *p != id);
        self.scene.despawn(id);
    }

    fn remove_target(&mut self, id: EntityId) {
        self.targets.retain(|t| *t != id);
        self.registry.remove(id);
        self.scene.despawn(id);
    }

    fn respawn_target(&mut self, id: EntityId) {
        let Some(position) = self.random_point_in_model() else {
            self.remove_target(id);
            return;
        };
        self.scene.set_position(id, position);
        self.event_log.push(GameEvent::TargetRespawned { id, position });
    }

    fn random_point_in_model(&mut self) -> Option<Vec3> {
        let bounds = self.model_bounds?;
        let mut axis = |lo: f32, hi: f32| {
            if lo < hi {
                self.rng.gen_range(lo..=hi)
            } else {
                lo
            }
        };
        Some(Vec3::new(
            axis(bounds.min.x, bounds.max.x),
            axis(bounds.min.y, bounds.max.y),
            axis(bounds.min.z, bounds.max.z),
        ))
    }
}
