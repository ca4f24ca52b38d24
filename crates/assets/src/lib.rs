//! Model loading: glTF 2.0 (`.gltf` + buffers, or binary `.glb`) into a
//! world-space [`Model`].
//!
//! Node transforms are baked into vertex data while walking the scene
//! hierarchy, so consumers never see parent/child relationships. Base color
//! images are decoded to RGBA8; an image that fails to decode is logged and
//! its meshes fall back to their material color.

use glam::{Mat3, Mat4, Vec2, Vec3};
use gltf::image::Format;
use gltf::texture::WrappingMode;
use househunt_kernel::{Model, ModelMesh, ModelTexture, TextureTiling, WrapMode};
use std::path::Path;

/// Errors from model loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF document has no scene")]
    NoScene,
    #[error("model {0} contains no triangle meshes")]
    NoGeometry(String),
    #[error("missing position data for mesh: {0}")]
    MissingPositions(String),
}

/// Knobs applied while importing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Tiling forced onto every textured material.
    pub texture_repeat: Vec2,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            texture_repeat: Vec2::new(10.0, 20.0),
        }
    }
}

/// Load a model file. External buffers and images are resolved relative to
/// the file.
pub fn load_model(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Model, AssetError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(&data)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    build_model(name, &document, path.parent(), &buffers, options)
}

/// Load a model from memory. Only embedded or GLB-blob buffers and images
/// resolve.
pub fn load_model_from_slice(
    name: impl Into<String>,
    data: &[u8],
    options: &LoadOptions,
) -> Result<Model, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(data)?;
    let buffers = gltf::import_buffers(&document, None, blob)?;
    build_model(name.into(), &document, None, &buffers, options)
}

fn build_model(
    name: String,
    document: &gltf::Document,
    base: Option<&Path>,
    buffers: &[gltf::buffer::Data],
    options: &LoadOptions,
) -> Result<Model, AssetError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::NoScene)?;

    let (textures, slots) = decode_images(document, base, buffers);

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        process_node(&node, Mat4::IDENTITY, buffers, &slots, &mut meshes)?;
    }
    if meshes.is_empty() {
        return Err(AssetError::NoGeometry(name));
    }

    let mut model = Model::new(name, meshes).with_textures(textures);
    let tiled = model.apply_texture_tiling(options.texture_repeat);
    tracing::info!(
        model = %model.name,
        meshes = model.meshes.len(),
        triangles = model.triangle_count(),
        textures = model.textures.len(),
        tiled,
        "glTF model imported"
    );
    Ok(model)
}

/// Decode every image in the document. Returns the decoded textures and,
/// per glTF image index, the slot it landed in.
fn decode_images(
    document: &gltf::Document,
    base: Option<&Path>,
    buffers: &[gltf::buffer::Data],
) -> (Vec<ModelTexture>, Vec<Option<usize>>) {
    let mut textures = Vec::new();
    let mut slots = Vec::new();
    for image in document.images() {
        let name = image
            .name()
            .map_or_else(|| format!("image{}", image.index()), str::to_string);
        let decoded = gltf::image::Data::from_source(image.source(), base, buffers)
            .map_err(|err| err.to_string())
            .and_then(|data| {
                let format = data.format;
                let (width, height) = (data.width, data.height);
                let rgba = to_rgba8(format, data.pixels)
                    .ok_or_else(|| format!("unsupported pixel format {format:?}"))?;
                ModelTexture::new(name.clone(), width, height, rgba)
                    .ok_or_else(|| "pixel data does not match image size".to_string())
            });
        match decoded {
            Ok(texture) => {
                tracing::debug!(
                    image = %name,
                    width = texture.width,
                    height = texture.height,
                    "texture decoded"
                );
                slots.push(Some(textures.len()));
                textures.push(texture);
            }
            Err(reason) => {
                tracing::warn!(image = %name, "texture not decoded: {reason}");
                slots.push(None);
            }
        }
    }
    (textures, slots)
}

/// Expand 8-bit pixel data to RGBA8. Wider formats are not supported.
fn to_rgba8(format: Format, pixels: Vec<u8>) -> Option<Vec<u8>> {
    match format {
        Format::R8G8B8A8 => Some(pixels),
        Format::R8G8B8 => Some(
            pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
                .collect(),
        ),
        Format::R8G8 => Some(
            pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
        ),
        Format::R8 => Some(pixels.iter().flat_map(|&l| [l, l, l, u8::MAX]).collect()),
        _ => None,
    }
}

fn wrap_mode(mode: WrappingMode) -> WrapMode {
    match mode {
        WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
        WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
        WrappingMode::Repeat => WrapMode::Repeat,
    }
}

/// Process a node and its children, accumulating the world transform.
fn process_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    slots: &[Option<usize>],
    meshes: &mut Vec<ModelMesh>,
) -> Result<(), AssetError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("unnamed");
        for (index, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(mesh = mesh_name, mode = ?primitive.mode(), "skipping non-triangle primitive");
                continue;
            }
            let name = format!("{mesh_name}#{index}");
            meshes.push(extract_primitive(&primitive, name, world, buffers, slots)?);
        }
    }

    for child in node.children() {
        process_node(&child, world, buffers, slots, meshes)?;
    }
    Ok(())
}

/// Read one primitive into world space.
fn extract_primitive(
    primitive: &gltf::Primitive,
    name: String,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    slots: &[Option<usize>],
) -> Result<ModelMesh, AssetError> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| AssetError::MissingPositions(name.clone()))?
        .map(|p| world.transform_point3(Vec3::from(p)))
        .collect();

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let normal_matrix = normal_matrix(world);
    let normals: Vec<Vec3> = match reader.read_normals() {
        Some(iter) => iter
            .map(|n| (normal_matrix * Vec3::from(n)).normalize_or_zero())
            .collect(),
        None => face_normals(&positions, &indices),
    };

    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    let base_texture = pbr.base_color_texture();

    let uv_set = base_texture.as_ref().map_or(0, |info| info.tex_coord());
    let uvs: Vec<Vec2> = reader
        .read_tex_coords(uv_set)
        .map(|iter| iter.into_f32().map(Vec2::from).collect())
        .unwrap_or_default();

    let (texture, tiling) = match &base_texture {
        Some(info) => {
            let texture = info.texture();
            let slot = slots.get(texture.source().index()).copied().flatten();
            let sampler = texture.sampler();
            let tiling = TextureTiling {
                wrap_s: wrap_mode(sampler.wrap_s()),
                wrap_t: wrap_mode(sampler.wrap_t()),
                repeat: Vec2::ONE,
            };
            (slot, slot.map(|_| tiling))
        }
        None => (None, None),
    };

    Ok(ModelMesh {
        name,
        positions,
        normals,
        uvs,
        indices,
        base_color: pbr.base_color_factor(),
        texture,
        tiling,
        double_sided: material.double_sided(),
    })
}

/// Inverse-transpose of the upper 3x3, falling back to the plain matrix when
/// the transform is singular.
fn normal_matrix(world: Mat4) -> Mat3 {
    let m = Mat3::from_mat4(world);
    if m.determinant().abs() < 1e-8 {
        m
    } else {
        m.inverse().transpose()
    }
}

/// Area-weighted vertex normals for primitives that ship without them.
fn face_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

pub fn crate_info() -> &'static str {
    "househunt-assets v0.1.0"
}
