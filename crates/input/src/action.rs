/// Planar movement keys. The desktop app binds these to the arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
}

impl MoveKey {
    pub const ALL: [MoveKey; 4] = [
        MoveKey::Forward,
        MoveKey::Backward,
        MoveKey::Left,
        MoveKey::Right,
    ];
}

/// A high-level action produced by a raw input device.
///
/// The game consumes snapshots built from actions, never raw window events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// A movement key went down.
    Press(MoveKey),
    /// A movement key went up.
    Release(MoveKey),
    /// Relative pointer motion in pixels.
    Look { dx: f32, dy: f32 },
    /// Fire one projectile.
    Fire,
    /// Input that has no binding.
    Noop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_press_release_carry_key() {
        let a = Action::Press(MoveKey::Left);
        assert!(matches!(a, Action::Press(MoveKey::Left)));
        let b = Action::Release(MoveKey::Left);
        assert_ne!(a, b);
    }

    #[test]
    fn all_keys_are_distinct() {
        for (i, a) in MoveKey::ALL.iter().enumerate() {
            for b in &MoveKey::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
