//! Shared types used across the househunt crates.

pub mod types;

pub use types::{Aabb, EntityId, Ray, Transform};
