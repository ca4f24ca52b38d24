//! wgpu render backend for the house scene.
//!
//! Draws the loaded model with ambient, directional and point lighting
//! followed by ACES tone mapping, then targets and projectiles as unlit
//! instanced spheres.
//!
//! # Invariants
//! - Renderer never mutates game state.
//! - GPU buffers for the model are built once, when the model finishes loading.

mod camera;
mod gpu;
mod mesh;
mod shaders;

pub use camera::Projection;
pub use gpu::WgpuRenderer;
pub use mesh::{BakedModel, MeshDraw, ModelVertex, SphereVertex, bake_model, uv_sphere};
