//! CPU-side model data produced by the asset loader.
//!
//! All geometry is baked into world space at load time, so the kernel never
//! needs the source scene hierarchy.

use glam::{Vec2, Vec3};
use househunt_common::Aabb;
use serde::{Deserialize, Serialize};

/// Texture coordinate wrapping, mirroring the glTF sampler modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    Repeat,
}

/// Decoded RGBA8 image referenced by textured meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed rows, four bytes per pixel.
    pub rgba: Vec<u8>,
}

impl ModelTexture {
    /// `None` unless `rgba` holds exactly `width * height` pixels.
    pub fn new(name: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (width > 0 && height > 0 && rgba.len() == expected).then(|| Self {
            name: name.into(),
            width,
            height,
            rgba,
        })
    }
}

/// Tiling applied to a textured material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureTiling {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub repeat: Vec2,
}

impl TextureTiling {
    pub fn repeat(repeat: Vec2) -> Self {
        Self {
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            repeat,
        }
    }
}

/// One triangle list with a single material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Empty when the source primitive had no texture coordinates.
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
    /// Index into [`Model::textures`] of the base color texture.
    pub texture: Option<usize>,
    pub tiling: Option<TextureTiling>,
    /// Back faces block rays too. glTF materials default to single-sided.
    pub double_sided: bool,
}

impl ModelMesh {
    /// A closed box with inward- and outward-facing sides alike usable for
    /// collision. Handy for generated rooms and tests.
    pub fn cuboid(name: impl Into<String>, bounds: Aabb, base_color: [f32; 4]) -> Self {
        let (lo, hi) = (bounds.min, bounds.max);
        let faces: [([Vec3; 4], Vec3); 6] = [
            (
                [
                    Vec3::new(lo.x, lo.y, hi.z),
                    Vec3::new(hi.x, lo.y, hi.z),
                    Vec3::new(hi.x, hi.y, hi.z),
                    Vec3::new(lo.x, hi.y, hi.z),
                ],
                Vec3::Z,
            ),
            (
                [
                    Vec3::new(hi.x, lo.y, lo.z),
                    Vec3::new(lo.x, lo.y, lo.z),
                    Vec3::new(lo.x, hi.y, lo.z),
                    Vec3::new(hi.x, hi.y, lo.z),
                ],
                Vec3::NEG_Z,
            ),
            (
                [
                    Vec3::new(hi.x, lo.y, hi.z),
                    Vec3::new(hi.x, lo.y, lo.z),
                    Vec3::new(hi.x, hi.y, lo.z),
                    Vec3::new(hi.x, hi.y, hi.z),
                ],
                Vec3::X,
            ),
            (
                [
                    Vec3::new(lo.x, lo.y, lo.z),
                    Vec3::new(lo.x, lo.y, hi.z),
                    Vec3::new(lo.x, hi.y, hi.z),
                    Vec3::new(lo.x, hi.y, lo.z),
                ],
                Vec3::NEG_X,
            ),
            (
                [
                    Vec3::new(lo.x, hi.y, hi.z),
                    Vec3::new(hi.x, hi.y, hi.z),
                    Vec3::new(hi.x, hi.y, lo.z),
                    Vec3::new(lo.x, hi.y, lo.z),
                ],
                Vec3::Y,
            ),
            (
                [
                    Vec3::new(lo.x, lo.y, lo.z),
                    Vec3::new(hi.x, lo.y, lo.z),
                    Vec3::new(hi.x, lo.y, hi.z),
                    Vec3::new(lo.x, lo.y, hi.z),
                ],
                Vec3::NEG_Y,
            ),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (corners, normal) in faces {
            let base = positions.len() as u32;
            positions.extend(corners);
            normals.extend([normal; 4]);
            uvs.extend([
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ]);
            indices.extend([base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self {
            name: name.into(),
            positions,
            normals,
            uvs,
            indices,
            base_color,
            texture: None,
            tiling: None,
            double_sided: true,
        }
    }

    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// World-space triangles. Indices past the end of `positions` are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Texture coordinates with the tiling factor applied.
    pub fn tiled_uvs(&self) -> Vec<Vec2> {
        let repeat = self.tiling.map_or(Vec2::ONE, |t| t.repeat);
        self.uvs.iter().map(|uv| *uv * repeat).collect()
    }
}

/// A loaded scene: every mesh primitive, flattened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<ModelMesh>,
    #[serde(default)]
    pub textures: Vec<ModelTexture>,
}

impl Model {
    pub fn new(name: impl Into<String>, meshes: Vec<ModelMesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
            textures: Vec::new(),
        }
    }

    pub fn with_textures(mut self, textures: Vec<ModelTexture>) -> Self {
        self.textures = textures;
        self
    }

    /// Texture sampled by `mesh`, if it has one and the index is valid.
    pub fn texture_of(&self, mesh: &ModelMesh) -> Option<&ModelTexture> {
        self.textures.get(mesh.texture?)
    }

    /// A hollow room: floor, ceiling and four walls as separate meshes.
    pub fn room(name: impl Into<String>, bounds: Aabb, wall_thickness: f32) -> Self {
        let (lo, hi) = (bounds.min, bounds.max);
        let t = wall_thickness;
        let grey = [0.6, 0.6, 0.6, 1.0];
        let slab = |name: &str, min: Vec3, max: Vec3| {
            ModelMesh::cuboid(name, Aabb::new(min, max), grey)
        };
        Self::new(
            name,
            vec![
                slab("floor", lo, Vec3::new(hi.x, lo.y + t, hi.z)),
                slab("ceiling", Vec3::new(lo.x, hi.y - t, lo.z), hi),
                slab("wall_west", lo, Vec3::new(lo.x + t, hi.y, hi.z)),
                slab("wall_east", Vec3::new(hi.x - t, lo.y, lo.z), hi),
                slab("wall_north", lo, Vec3::new(hi.x, hi.y, lo.z + t)),
                slab("wall_south", Vec3::new(lo.x, lo.y, hi.z - t), hi),
            ],
        )
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.meshes
            .iter()
            .filter_map(ModelMesh::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(ModelMesh::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    /// Force repeat wrapping with the given factor on every textured mesh.
    /// Returns how many meshes were touched.
    pub fn apply_texture_tiling(&mut self, repeat: Vec2) -> usize {
        let mut touched = 0;
        for mesh in self.meshes.iter_mut().filter(|m| m.is_textured()) {
            mesh.tiling = Some(TextureTiling::repeat(repeat));
            touched += 1;
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_has_twelve_triangles_inside_bounds() {
        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 3.0, 2.0));
        let mesh = ModelMesh::cuboid("box", bounds, [1.0; 4]);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.triangles().count(), 12);
        assert_eq!(mesh.bounds(), Some(bounds));
        assert!(mesh.triangles().flatten().all(|p| bounds.contains(p)));
    }

    #[test]
    fn triangles_skip_out_of_range_indices() {
        let mut mesh = ModelMesh::cuboid("box", Aabb::new(Vec3::ZERO, Vec3::ONE), [1.0; 4]);
        mesh.indices.extend([0, 1, 999]);
        assert_eq!(mesh.triangle_count(), 13);
        assert_eq!(mesh.triangles().count(), 12);
    }

    #[test]
    fn room_bounds_span_all_walls() {
        let bounds = Aabb::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 4.0, 5.0));
        let room = Model::room("room", bounds, 0.2);
        assert_eq!(room.meshes.len(), 6);
        assert_eq!(room.bounds(), Some(bounds));
        assert_eq!(room.triangle_count(), 72);
    }

    #[test]
    fn empty_model_has_no_bounds() {
        assert!(Model::default().bounds().is_none());
    }

    #[test]
    fn tiling_applies_only_to_textured_meshes() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let mut plain = ModelMesh::cuboid("plain", bounds, [1.0; 4]);
        plain.uvs.truncate(1);
        let mut textured = plain.clone();
        textured.name = "textured".into();
        textured.texture = Some(0);
        textured.tiling = Some(TextureTiling {
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::MirroredRepeat,
            repeat: Vec2::ONE,
        });
        let mut model = Model::new("m", vec![plain, textured]);

        let touched = model.apply_texture_tiling(Vec2::new(10.0, 20.0));
        assert_eq!(touched, 1);
        assert!(model.meshes[0].tiling.is_none());
        let tiling = model.meshes[1].tiling.unwrap();
        assert_eq!(tiling.wrap_s, WrapMode::Repeat);
        assert_eq!(tiling.wrap_t, WrapMode::Repeat);
        assert_eq!(model.meshes[1].tiled_uvs(), vec![Vec2::new(0.0, 20.0)]);
        assert_eq!(model.meshes[0].tiled_uvs(), vec![Vec2::new(0.0, 1.0)]);
    }

    #[test]
    fn texture_size_must_match_pixels() {
        assert!(ModelTexture::new("ok", 2, 1, vec![0; 8]).is_some());
        assert!(ModelTexture::new("short", 2, 2, vec![0; 8]).is_none());
        assert!(ModelTexture::new("empty", 0, 0, Vec::new()).is_none());
    }

    #[test]
    fn texture_lookup_ignores_bad_indices() {
        let texture = ModelTexture::new("white", 1, 1, vec![255; 4]).unwrap();
        let mut mesh = ModelMesh::cuboid("box", Aabb::new(Vec3::ZERO, Vec3::ONE), [1.0; 4]);
        let model = Model::new("m", Vec::new()).with_textures(vec![texture.clone()]);
        assert!(model.texture_of(&mesh).is_none());
        mesh.texture = Some(0);
        assert_eq!(model.texture_of(&mesh), Some(&texture));
        mesh.texture = Some(3);
        assert!(model.texture_of(&mesh).is_none());
    }
}
