use glam::Vec3;
use househunt_kernel::{Game, NodeKind, PlayerCamera};
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Camera up vector.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self::from_camera(&PlayerCamera::new(Vec3::new(0.0, 8.0, -4.0)))
    }
}

impl RenderView {
    /// View looking one unit along the camera's facing direction.
    pub fn from_camera(camera: &PlayerCamera) -> Self {
        Self {
            eye: camera.position,
            target: camera.position + camera.forward(),
            up: camera.up(),
            fov_degrees: 75.0,
        }
    }

    pub fn direction(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads game state and a view, then produces output. It never
/// mutates the game.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given game state and view.
    fn render(&self, game: &Game, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable dump of the game for CLI output and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// List every target and projectile, not just the counts.
    pub list_nodes: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes() -> Self {
        Self { list_nodes: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, game: &Game, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== House Hunt (tick={}, phase={:?}) ===",
            game.tick_count(),
            game.phase()
        );
        let _ = writeln!(out, "{}", game.hud().score_text());
        if let Some(banner) = game.hud().win_text() {
            let _ = writeln!(out, "*** {banner} ***");
        }
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) dir=({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.direction().x,
            view.direction().y,
            view.direction().z,
            view.fov_degrees
        );
        if let Some(model) = game.model() {
            let _ = writeln!(
                out,
                "Model: {} ({} meshes, {} triangles)",
                model.name,
                model.meshes.len(),
                model.triangle_count()
            );
        }
        let _ = writeln!(
            out,
            "Targets: {}  Projectiles: {}  Collidables: {}",
            game.targets().len(),
            game.projectiles().len(),
            game.registry().len()
        );

        if self.list_nodes {
            for (id, node) in game.scene().nodes() {
                let label = match node.kind {
                    NodeKind::ModelMesh { .. } => continue,
                    NodeKind::Target { .. } => "target",
                    NodeKind::Projectile { .. } => "projectile",
                };
                let p = node.position();
                let _ = writeln!(
                    out,
                    "  [{}] {label} pos=({:.2}, {:.2}, {:.2})",
                    id.short(),
                    p.x,
                    p.y,
                    p.z
                );
            }
        }

        out
    }
}
