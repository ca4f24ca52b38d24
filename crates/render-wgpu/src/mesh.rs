use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use househunt_kernel::{Model, WrapMode};
use std::f32::consts::{PI, TAU};
use std::ops::Range;

/// Vertex of the baked house model. `color` is the material base color and
/// `uv` already carries the texture tiling factor.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// Unit-sphere vertex, scaled and placed per instance.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
}

/// A run of indices drawn with one texture and sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDraw {
    pub indices: Range<u32>,
    /// Index into [`Model::textures`]; `None` draws with the base color only.
    pub texture: Option<usize>,
    /// Sampler wrapping along U and V.
    pub wrap: [WrapMode; 2],
}

/// CPU-side buffers for a whole model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BakedModel {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub draws: Vec<MeshDraw>,
}

/// Flatten every mesh of a model into one vertex/index buffer pair.
///
/// Triangles referencing vertices outside their mesh are dropped. Adjacent
/// meshes sharing a texture and wrap mode collapse into a single draw.
pub fn bake_model(model: &Model) -> BakedModel {
    let mut baked = BakedModel {
        vertices: Vec::with_capacity(model.vertex_count()),
        indices: Vec::with_capacity(model.triangle_count() * 3),
        draws: Vec::new(),
    };

    for mesh in &model.meshes {
        let base = baked.vertices.len() as u32;
        let count = mesh.positions.len() as u32;
        let uvs = mesh.tiled_uvs();
        for (i, position) in mesh.positions.iter().enumerate() {
            let normal = mesh.normals.get(i).copied().unwrap_or(Vec3::Y);
            let uv = uvs.get(i).copied().unwrap_or(Vec2::ZERO);
            baked.vertices.push(ModelVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                color: mesh.base_color,
                uv: uv.to_array(),
            });
        }

        let first = baked.indices.len() as u32;
        for tri in mesh.indices.chunks_exact(3) {
            if tri.iter().all(|&i| i < count) {
                baked.indices.extend(tri.iter().map(|&i| base + i));
            }
        }
        let last = baked.indices.len() as u32;
        if first == last {
            continue;
        }

        let texture = model.texture_of(mesh).and(mesh.texture);
        let wrap = mesh
            .tiling
            .map_or([WrapMode::Repeat; 2], |t| [t.wrap_s, t.wrap_t]);
        match baked.draws.last_mut() {
            Some(prev) if prev.texture == texture && prev.wrap == wrap => prev.indices.end = last,
            _ => baked.draws.push(MeshDraw {
                indices: first..last,
                texture,
                wrap,
            }),
        }
    }
    baked
}

/// Latitude/longitude sphere of radius 1.
pub fn uv_sphere(segments: u16, rings: u16) -> (Vec<SphereVertex>, Vec<u16>) {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
    for ring in 0..=rings {
        let theta = ring as f32 / rings as f32 * PI;
        for seg in 0..=segments {
            let phi = seg as f32 / segments as f32 * TAU;
            vertices.push(SphereVertex {
                position: [
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                ],
            });
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            if ring != 0 {
                indices.extend_from_slice(&[a, b, a + 1]);
            }
            if ring != rings - 1 {
                indices.extend_from_slice(&[b, b + 1, a + 1]);
            }
        }
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use househunt_common::Aabb;
    use househunt_kernel::{ModelMesh, ModelTexture};

    fn textured_box_model() -> Model {
        let mut mesh = ModelMesh::cuboid("box", Aabb::new(Vec3::ZERO, Vec3::ONE), [1.0; 4]);
        mesh.texture = Some(0);
        let texture = ModelTexture::new("plaster", 1, 1, vec![200, 180, 160, 255]).unwrap();
        Model::new("m", vec![mesh]).with_textures(vec![texture])
    }

    #[test]
    fn sphere_vertices_are_on_unit_sphere() {
        let (vertices, indices) = uv_sphere(16, 16);
        assert_eq!(vertices.len(), 17 * 17);
        // Pole rows contribute one triangle per segment, the rest two.
        assert_eq!(indices.len(), (16 * 2 + 16 * 14 * 2) * 3);
        for v in &vertices {
            assert!((Vec3::from(v.position).length() - 1.0).abs() < 1e-5);
        }
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn baked_model_offsets_indices_per_mesh() {
        let model = Model::room(
            "room",
            Aabb::new(Vec3::ZERO, Vec3::new(4.0, 3.0, 4.0)),
            0.1,
        );
        let baked = bake_model(&model);
        assert_eq!(baked.vertices.len(), model.vertex_count());
        assert_eq!(baked.indices.len(), model.triangle_count() * 3);
        assert!(baked.indices.iter().all(|&i| (i as usize) < baked.vertices.len()));
        // Second mesh starts after the first mesh's 24 vertices.
        assert!(baked.indices[36..72].iter().all(|&i| (24..48).contains(&i)));
        assert_eq!(baked.vertices[0].color, model.meshes[0].base_color);
        // Six untextured slabs share one draw.
        assert_eq!(
            baked.draws,
            vec![MeshDraw {
                indices: 0..216,
                texture: None,
                wrap: [WrapMode::Repeat; 2],
            }]
        );
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let mut model = Model::room("room", Aabb::new(Vec3::ZERO, Vec3::ONE), 0.1);
        model.meshes.truncate(1);
        model.meshes[0].indices.extend_from_slice(&[0, 1, 99]);
        let baked = bake_model(&model);
        assert_eq!(baked.indices.len(), 36);
        assert_eq!(baked.draws[0].indices, 0..36);
    }

    #[test]
    fn tiling_scales_baked_uvs() {
        let untiled = bake_model(&textured_box_model());
        let mut model = textured_box_model();
        assert_eq!(model.apply_texture_tiling(Vec2::new(10.0, 20.0)), 1);
        let tiled = bake_model(&model);

        assert_ne!(untiled.vertices, tiled.vertices);
        let max = |baked: &BakedModel| {
            baked
                .vertices
                .iter()
                .fold(Vec2::ZERO, |acc, v| acc.max(Vec2::from(v.uv)))
        };
        assert_eq!(max(&untiled), Vec2::ONE);
        assert_eq!(max(&tiled), Vec2::new(10.0, 20.0));
        assert_eq!(tiled.draws.len(), 1);
        assert_eq!(tiled.draws[0].texture, Some(0));
        assert_eq!(tiled.draws[0].wrap, [WrapMode::Repeat; 2]);
    }

    #[test]
    fn textured_and_plain_meshes_draw_separately() {
        let mut model = textured_box_model();
        let plain = ModelMesh::cuboid("plain", Aabb::new(Vec3::ONE, Vec3::splat(2.0)), [1.0; 4]);
        model.meshes.push(plain);
        let baked = bake_model(&model);
        assert_eq!(baked.draws.len(), 2);
        assert_eq!(baked.draws[0].indices, 0..36);
        assert_eq!(baked.draws[0].texture, Some(0));
        assert_eq!(baked.draws[1].indices, 36..72);
        assert_eq!(baked.draws[1].texture, None);
    }

    #[test]
    fn dangling_texture_index_draws_untextured() {
        let mut model = textured_box_model();
        model.textures.clear();
        let baked = bake_model(&model);
        assert_eq!(baked.draws[0].texture, None);
    }
}
