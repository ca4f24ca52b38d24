//! Rendering adapter: renderer-agnostic view, lighting and a text renderer.
//!
//! # Invariants
//! - Renderers read [`Game`](househunt_kernel::Game) state; they never mutate it.
//! - The view is derived from the player camera every frame.

mod lighting;
mod renderer;

pub use lighting::{DirectionalLight, PointLight, SceneLighting, ToneMapping};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "househunt-render v0.1.0"
}
