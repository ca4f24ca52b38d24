use crate::camera::Projection;
use crate::mesh::{self, MeshDraw, ModelVertex, SphereVertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use househunt_kernel::{Game, Model, NodeKind, WrapMode};
use househunt_render::{RenderView, SceneLighting, ToneMapping};
use std::ops::Range;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BASE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const MAX_SPHERES: u32 = 4096;
const TARGET_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const PROJECTILE_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    sun_direction: [f32; 4],
    sun_color: [f32; 4],
    point_position: [f32; 4],
    point_color: [f32; 4],
    params: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: Mat4, lighting: &SceneLighting) -> Self {
        let aces = match lighting.tone_mapping {
            ToneMapping::AcesFilmic => 1.0,
            ToneMapping::None => 0.0,
        };
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            ambient: lighting.ambient.extend(1.0).to_array(),
            sun_direction: lighting.sun.direction.extend(lighting.sun.intensity).to_array(),
            sun_color: lighting.sun.color.extend(1.0).to_array(),
            point_position: lighting.point.position.extend(lighting.point.range).to_array(),
            point_color: lighting.point.color.extend(lighting.point.intensity).to_array(),
            params: [lighting.exposure, aces, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SphereInstance {
    center_radius: [f32; 4],
    color: [f32; 4],
}

/// Texture and wrap pair shared by one bind group.
type TextureKey = (Option<usize>, [WrapMode; 2]);

struct GpuDraw {
    indices: Range<u32>,
    bind_group: usize,
}

struct ModelBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    draws: Vec<GpuDraw>,
    bind_groups: Vec<wgpu::BindGroup>,
}

/// wgpu renderer for the house, targets and projectiles.
pub struct WgpuRenderer {
    model_pipeline: wgpu::RenderPipeline,
    sphere_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    model: Option<ModelBuffers>,
    sphere_vertex_buffer: wgpu::Buffer,
    sphere_index_buffer: wgpu::Buffer,
    sphere_index_count: u32,
    instance_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::new(Mat4::IDENTITY, &SceneLighting::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let model_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("model_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        // House model: lit, textured, both faces drawn
        let model_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("model_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::model_shader().into()),
        });
        let model_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("model_pipeline"),
            layout: Some(&model_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &model_shader,
                entry_point: Some("vs_model"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ModelVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x4,
                        3 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &model_shader,
                entry_point: Some("fs_model"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Targets and projectiles
        let sphere_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::sphere_shader().into()),
        });
        let sphere_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sphere_shader,
                entry_point: Some("vs_sphere"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<SphereVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<SphereInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            1 => Float32x4,
                            2 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sphere_shader,
                entry_point: Some("fs_sphere"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (sphere_verts, sphere_indices) = mesh::uv_sphere(16, 16);
        let sphere_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_vertex_buffer"),
            contents: bytemuck::cast_slice(&sphere_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sphere_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_index_buffer"),
            contents: bytemuck::cast_slice(&sphere_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sphere_instance_buffer"),
            size: MAX_SPHERES as u64 * std::mem::size_of::<SphereInstance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            model_pipeline,
            sphere_pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            model: None,
            sphere_vertex_buffer,
            sphere_index_buffer,
            sphere_index_count: sphere_indices.len() as u32,
            instance_buffer,
            depth_texture: Self::create_depth_texture(device, width, height),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Bake a loaded model into GPU buffers and upload its textures,
    /// replacing any previous model.
    pub fn upload_model(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, model: &Model) {
        let baked = mesh::bake_model(model);
        if baked.indices.is_empty() {
            tracing::warn!(model = %model.name, "model has nothing to draw");
            self.model = None;
            return;
        }
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model_vertex_buffer"),
            contents: bytemuck::cast_slice(&baked.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model_index_buffer"),
            contents: bytemuck::cast_slice(&baked.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let max_dimension = device.limits().max_texture_dimension_2d;
        let views: Vec<Option<wgpu::TextureView>> = model
            .textures
            .iter()
            .map(|texture| {
                if texture.width > max_dimension || texture.height > max_dimension {
                    tracing::warn!(
                        texture = %texture.name,
                        width = texture.width,
                        height = texture.height,
                        max_dimension,
                        "texture too large, drawing base color"
                    );
                    return None;
                }
                Some(upload_texture(
                    device,
                    queue,
                    &texture.name,
                    texture.width,
                    texture.height,
                    &texture.rgba,
                ))
            })
            .collect();
        let white = upload_texture(device, queue, "white_texture", 1, 1, &[u8::MAX; 4]);

        let (keys, slots) = bind_group_slots(&baked.draws);
        let mut samplers: Vec<([WrapMode; 2], wgpu::Sampler)> = Vec::new();
        let mut bind_groups = Vec::with_capacity(keys.len());
        for (texture, wrap) in &keys {
            let sampler = match samplers.iter().position(|(w, _)| w == wrap) {
                Some(i) => i,
                None => {
                    samplers.push((*wrap, device.create_sampler(&sampler_descriptor(*wrap))));
                    samplers.len() - 1
                }
            };
            let view = texture
                .and_then(|i| views.get(i))
                .and_then(Option::as_ref)
                .unwrap_or(&white);
            bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("model_texture_bind_group"),
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&samplers[sampler].1),
                    },
                ],
            }));
        }

        let draws: Vec<GpuDraw> = baked
            .draws
            .iter()
            .zip(slots)
            .map(|(draw, bind_group)| GpuDraw {
                indices: draw.indices.clone(),
                bind_group,
            })
            .collect();

        tracing::info!(
            model = %model.name,
            vertices = baked.vertices.len(),
            triangles = baked.indices.len() / 3,
            textures = model.textures.len(),
            draws = draws.len(),
            "model uploaded"
        );
        self.model = Some(ModelBuffers {
            vertex,
            index,
            draws,
            bind_groups,
        });
    }

    /// Render one frame: house model, then target and projectile spheres.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        view: &RenderView,
        projection: &Projection,
        game: &Game,
        lighting: &SceneLighting,
    ) {
        let uniforms = Uniforms::new(projection.view_projection(view), lighting);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let instances = sphere_instances(game);
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if let Some(model) = &self.model {
                pass.set_pipeline(&self.model_pipeline);
                pass.set_vertex_buffer(0, model.vertex.slice(..));
                pass.set_index_buffer(model.index.slice(..), wgpu::IndexFormat::Uint32);
                for draw in &model.draws {
                    pass.set_bind_group(1, &model.bind_groups[draw.bind_group], &[]);
                    pass.draw_indexed(draw.indices.clone(), 0, 0..1);
                }
            }

            if !instances.is_empty() {
                pass.set_pipeline(&self.sphere_pipeline);
                pass.set_vertex_buffer(0, self.sphere_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(
                    self.sphere_index_buffer.slice(..),
                    wgpu::IndexFormat::Uint16,
                );
                pass.draw_indexed(0..self.sphere_index_count, 0, 0..instances.len() as u32);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: BASE_COLOR_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    texture.create_view(&Default::default())
}

fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
    }
}

fn sampler_descriptor(wrap: [WrapMode; 2]) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("model_sampler"),
        address_mode_u: address_mode(wrap[0]),
        address_mode_v: address_mode(wrap[1]),
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

/// Distinct texture/wrap pairs in first-use order, and for each draw the
/// index of its pair.
fn bind_group_slots(draws: &[MeshDraw]) -> (Vec<TextureKey>, Vec<usize>) {
    let mut keys: Vec<TextureKey> = Vec::new();
    let slots = draws
        .iter()
        .map(|draw| {
            let key = (draw.texture, draw.wrap);
            keys.iter().position(|k| *k == key).unwrap_or_else(|| {
                keys.push(key);
                keys.len() - 1
            })
        })
        .collect();
    (keys, slots)
}

/// One instance per live target and projectile, capped at the buffer size.
fn sphere_instances(game: &Game) -> Vec<SphereInstance> {
    game.scene()
        .nodes()
        .values()
        .filter_map(|node| {
            let color = match node.kind {
                NodeKind::Target { .. } => TARGET_COLOR,
                NodeKind::Projectile { .. } => PROJECTILE_COLOR,
                NodeKind::ModelMesh { .. } => return None,
            };
            let radius = node.radius()?;
            let center: Vec3 = node.position();
            Some(SphereInstance {
                center_radius: center.extend(radius).to_array(),
                color,
            })
        })
        .take(MAX_SPHERES as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use househunt_common::Aabb;
    use househunt_kernel::GameConfig;

    #[test]
    fn uniforms_pack_lighting() {
        let lighting = SceneLighting::default();
        let u = Uniforms::new(Mat4::IDENTITY, &lighting);
        assert_eq!(std::mem::size_of::<Uniforms>(), 160);
        assert_eq!(u.point_position, [0.0, 9.0, -40.0, 100.0]);
        assert_eq!(u.params[0], 1.5);
        assert_eq!(u.params[1], 1.0);
        assert_eq!(u.ambient[0], 0.2);
    }

    #[test]
    fn wrap_modes_map_to_address_modes() {
        let sampler = sampler_descriptor([WrapMode::Repeat, WrapMode::Repeat]);
        assert_eq!(sampler.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(sampler.address_mode_v, wgpu::AddressMode::Repeat);

        let sampler = sampler_descriptor([WrapMode::ClampToEdge, WrapMode::MirroredRepeat]);
        assert_eq!(sampler.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(sampler.address_mode_v, wgpu::AddressMode::MirrorRepeat);
    }

    #[test]
    fn draws_share_bind_groups_by_texture_and_wrap() {
        let repeat = [WrapMode::Repeat; 2];
        let draw = |indices: Range<u32>, texture: Option<usize>, wrap| MeshDraw {
            indices,
            texture,
            wrap,
        };
        let draws = [
            draw(0..6, Some(0), repeat),
            draw(6..12, None, repeat),
            draw(12..18, Some(0), repeat),
            draw(18..24, Some(0), [WrapMode::ClampToEdge; 2]),
        ];
        let (keys, slots) = bind_group_slots(&draws);
        assert_eq!(
            keys,
            vec![
                (Some(0), repeat),
                (None, repeat),
                (Some(0), [WrapMode::ClampToEdge; 2]),
            ]
        );
        assert_eq!(slots, vec![0, 1, 0, 2]);
    }

    #[test]
    fn instances_color_targets_and_projectiles() {
        let mut game = Game::new(GameConfig {
            target_count: 3,
            seed: Some(1),
            ..GameConfig::default()
        });
        game.load_model(Model::room(
            "room",
            Aabb::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 4.0, 5.0)),
            0.2,
        ));
        game.fire();

        let instances = sphere_instances(&game);
        assert_eq!(instances.len(), 4);
        let green = instances.iter().filter(|i| i.color == TARGET_COLOR).count();
        let blue: Vec<_> = instances.iter().filter(|i| i.color == PROJECTILE_COLOR).collect();
        assert_eq!(green, 3);
        assert_eq!(blue.len(), 1);
        assert_eq!(blue[0].center_radius, [0.0, 8.0, -4.0, 0.6]);
    }
}
