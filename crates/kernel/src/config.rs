use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading a game configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// What happens to a target sphere after a projectile hits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetHitPolicy {
    /// The target leaves the scene for good.
    #[default]
    Destroy,
    /// The target jumps to a new random spot inside the model bounds.
    Respawn,
}

/// Every gameplay constant. Missing YAML keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Camera displacement per held key per frame.
    pub move_step: f32,
    /// Moves are vetoed when an obstruction is closer than this.
    pub clearance: f32,
    /// Projectile displacement per frame.
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub target_radius: f32,
    /// Center distance strictly below which a projectile scores.
    pub hit_distance: f32,
    pub win_score: u32,
    /// Targets seeded inside the model once it loads.
    pub target_count: usize,
    pub mouse_sensitivity: f32,
    pub start_position: Vec3,
    /// UV tiling applied to every textured material of the loaded model.
    pub texture_repeat: Vec2,
    pub target_hit_policy: TargetHitPolicy,
    /// Fixed seed for target placement; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_step: 0.1,
            clearance: 0.5,
            projectile_speed: 0.9,
            projectile_radius: 0.6,
            target_radius: 0.5,
            hit_distance: 0.5,
            win_score: 3,
            target_count: 100,
            mouse_sensitivity: 0.002,
            start_position: Vec3::new(0.0, 8.0, -4.0),
            texture_repeat: Vec2::new(10.0, 20.0),
            target_hit_policy: TargetHitPolicy::Destroy,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_game_constants() {
        let c = GameConfig::default();
        assert_eq!(c.move_step, 0.1);
        assert_eq!(c.clearance, 0.5);
        assert_eq!(c.projectile_speed, 0.9);
        assert_eq!(c.hit_distance, 0.5);
        assert_eq!(c.win_score, 3);
        assert_eq!(c.target_count, 100);
        assert_eq!(c.start_position, Vec3::new(0.0, 8.0, -4.0));
        assert_eq!(c.target_hit_policy, TargetHitPolicy::Destroy);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = GameConfig::from_yaml_str("win_score: 5\ntarget_hit_policy: respawn\nseed: 9\n")
            .unwrap();
        assert_eq!(c.win_score, 5);
        assert_eq!(c.target_hit_policy, TargetHitPolicy::Respawn);
        assert_eq!(c.seed, Some(9));
        assert_eq!(c.target_count, 100);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = GameConfig::from_yaml_str("win_score: [not, a, number]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "target_count: 12").unwrap();
        writeln!(tmp, "start_position: [1.0, 2.0, 3.0]").unwrap();
        let c = GameConfig::load(tmp.path()).unwrap();
        assert_eq!(c.target_count, 12);
        assert_eq!(c.start_position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = GameConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
