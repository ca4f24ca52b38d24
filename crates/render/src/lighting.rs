use glam::Vec3;

/// Sun-style light. `direction` points from the light toward the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// Omni light with linear falloff to zero at `range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
}

impl PointLight {
    /// Attenuation factor at `point`, 1 at the light and 0 at or past range.
    pub fn attenuation(&self, point: Vec3) -> f32 {
        if self.range <= 0.0 {
            return 0.0;
        }
        let d = self.position.distance(point);
        (1.0 - d / self.range).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMapping {
    None,
    #[default]
    AcesFilmic,
}

/// Fixed lighting rig for the house scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLighting {
    pub ambient: Vec3,
    pub sun: DirectionalLight,
    pub point: PointLight,
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
}

impl Default for SceneLighting {
    fn default() -> Self {
        let sun_position = Vec3::new(10.0, 10.0, 10.0);
        Self {
            ambient: Vec3::splat(0.2),
            sun: DirectionalLight {
                direction: (-sun_position).normalize(),
                color: Vec3::ONE,
                intensity: 0.001,
            },
            point: PointLight {
                position: Vec3::new(0.0, 9.0, -40.0),
                color: Vec3::new(1.0, 0.0, 0.0),
                intensity: 1.0,
                range: 100.0,
            },
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 1.5,
        }
    }
}

impl SceneLighting {
    /// ACES filmic curve (Narkowicz fit) applied after exposure, the same
    /// curve the model shader evaluates.
    pub fn tone_map(&self, color: Vec3) -> Vec3 {
        let c = color * self.exposure;
        match self.tone_mapping {
            ToneMapping::None => c.clamp(Vec3::ZERO, Vec3::ONE),
            ToneMapping::AcesFilmic => {
                let num = c * (c * 2.51 + 0.03);
                let den = c * (c * 2.43 + 0.59) + 0.14;
                (num / den).clamp(Vec3::ZERO, Vec3::ONE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rig_matches_house_scene() {
        let l = SceneLighting::default();
        assert_eq!(l.ambient, Vec3::splat(0.2));
        assert_eq!(l.point.position, Vec3::new(0.0, 9.0, -40.0));
        assert_eq!(l.point.range, 100.0);
        assert_eq!(l.exposure, 1.5);
        assert_eq!(l.tone_mapping, ToneMapping::AcesFilmic);
        assert!((l.sun.direction.length() - 1.0).abs() < 1e-6);
        assert!(l.sun.direction.y < 0.0);
    }

    #[test]
    fn point_light_falls_off_to_zero_at_range() {
        let p = SceneLighting::default().point;
        assert_eq!(p.attenuation(p.position), 1.0);
        assert!((p.attenuation(p.position + Vec3::X * 50.0) - 0.5).abs() < 1e-6);
        assert_eq!(p.attenuation(p.position + Vec3::X * 150.0), 0.0);
    }

    #[test]
    fn aces_stays_in_unit_range() {
        let l = SceneLighting::default();
        assert_eq!(l.tone_map(Vec3::ZERO), Vec3::ZERO);
        let bright = l.tone_map(Vec3::splat(100.0));
        assert!(bright.max_element() <= 1.0);
        assert!(bright.min_element() > 0.9);
        let mid = l.tone_map(Vec3::splat(0.2));
        assert!(mid.x > 0.0 && mid.x < 1.0);
    }
}
