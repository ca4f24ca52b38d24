//! Input tracking: device events mapped to actions, sampled once per frame.
//!
//! # Invariants
//! - Device callbacks only mutate the [`InputTracker`]; the game reads an
//!   immutable [`InputSnapshot`] taken at the start of each tick.
//! - Pitch is clamped to `[-PI/2, PI/2]` so the view never flips over.

pub mod action;

pub use action::{Action, MoveKey};

use std::f32::consts::FRAC_PI_2;

/// Default radians of rotation per pixel of pointer motion.
pub const DEFAULT_SENSITIVITY: f32 = 0.002;

/// The set of movement keys currently held down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    pub fn is_held(&self, key: MoveKey) -> bool {
        match key {
            MoveKey::Forward => self.forward,
            MoveKey::Backward => self.backward,
            MoveKey::Left => self.left,
            MoveKey::Right => self.right,
        }
    }

    pub fn set(&mut self, key: MoveKey, held: bool) {
        match key {
            MoveKey::Forward => self.forward = held,
            MoveKey::Backward => self.backward = held,
            MoveKey::Left => self.left = held,
            MoveKey::Right => self.right = held,
        }
    }

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

/// Immutable view of the input state handed to one game tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub held: HeldKeys,
    /// Accumulated horizontal look angle in radians.
    pub yaw: f32,
    /// Accumulated vertical look angle in radians, already clamped.
    pub pitch: f32,
    /// Fire actions received since the previous snapshot.
    pub fire_requests: u32,
}

impl InputSnapshot {
    /// A snapshot with the given keys held and nothing else going on.
    pub fn holding(keys: &[MoveKey]) -> Self {
        let mut held = HeldKeys::default();
        for key in keys {
            held.set(*key, true);
        }
        Self {
            held,
            ..Self::default()
        }
    }
}

/// Accumulates device actions between frames.
#[derive(Debug, Clone)]
pub struct InputTracker {
    held: HeldKeys,
    yaw: f32,
    pitch: f32,
    sensitivity: f32,
    pending_fire: u32,
}

impl Default for InputTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl InputTracker {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            held: HeldKeys::default(),
            yaw: 0.0,
            pitch: 0.0,
            sensitivity,
            pending_fire: 0,
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Press(key) => self.held.set(key, true),
            Action::Release(key) => self.held.set(key, false),
            Action::Look { dx, dy } => {
                self.yaw -= dx * self.sensitivity;
                self.pitch = (self.pitch - dy * self.sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
            }
            Action::Fire => {
                self.pending_fire += 1;
                tracing::trace!(pending = self.pending_fire, "fire requested");
            }
            Action::Noop => {}
        }
    }

    /// Drop every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held = HeldKeys::default();
    }

    pub fn held(&self) -> HeldKeys {
        self.held
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Take the per-frame snapshot. Pending fire requests are consumed;
    /// held keys and look angles persist.
    pub fn snapshot(&mut self) -> InputSnapshot {
        InputSnapshot {
            held: self.held,
            yaw: self.yaw,
            pitch: self.pitch,
            fire_requests: std::mem::take(&mut self.pending_fire),
        }
    }
}

pub fn crate_info() -> &'static str {
    "househunt-input v0.1.0"
}
