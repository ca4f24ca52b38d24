//! Game kernel: authoritative state for one play session.
//!
//! # Invariants
//! - All state lives in [`Game`]; there is no module-level mutable state.
//! - A live target appears exactly once in the target list and once in the
//!   collision registry.
//! - A projectile leaves the live list through exactly one removal: a hit,
//!   or the win that clears every live list.

pub mod camera;
pub mod collision;
pub mod config;
pub mod game;
pub mod hud;
pub mod model;
pub mod movement;
pub mod scene;
pub mod scoring;
pub mod shooting;

pub use camera::PlayerCamera;
pub use config::{ConfigError, GameConfig, TargetHitPolicy};
pub use game::{FrameReport, Game, GameEvent, GamePhase, GameSummary};
pub use hud::Hud;
pub use model::{Model, ModelMesh, ModelTexture, TextureTiling, WrapMode};
pub use movement::MoveOutcome;
pub use scene::{Node, NodeKind, Scene};

pub fn crate_info() -> &'static str {
    "househunt-kernel v0.1.0"
}
