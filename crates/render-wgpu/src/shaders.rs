/// Shared uniform block. Vectors are vec4 for std140 alignment.
///
/// `sun_direction.w` is the sun intensity, `point_position.w` the point
/// light range, `point_color.w` its intensity, `params.x` the exposure and
/// `params.y` 1.0 when ACES tone mapping is enabled.
const UNIFORMS: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    ambient: vec4<f32>,
    sun_direction: vec4<f32>,
    sun_color: vec4<f32>,
    point_position: vec4<f32>,
    point_color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
"#;

/// Lit pipeline for the house model. Group 1 holds the base color texture,
/// a 1x1 white image for untextured meshes.
const MODEL_BODY: &str = r#"
@group(1) @binding(0)
var base_texture: texture_2d<f32>;
@group(1) @binding(1)
var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) uv: vec2<f32>,
};

@vertex
fn vs_model(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.world_position = vertex.position;
    out.world_normal = vertex.normal;
    out.color = vertex.color;
    out.uv = vertex.uv;
    return out;
}

fn aces(x: vec3<f32>) -> vec3<f32> {
    let num = x * (2.51 * x + vec3<f32>(0.03));
    let den = x * (2.43 * x + vec3<f32>(0.59)) + vec3<f32>(0.14);
    return clamp(num / den, vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_model(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let albedo = in.color * textureSample(base_texture, base_sampler, in.uv);

    var n = normalize(in.world_normal);
    if (!front) {
        n = -n;
    }

    var light = uniforms.ambient.rgb;

    let to_sun = -normalize(uniforms.sun_direction.xyz);
    light += uniforms.sun_color.rgb * uniforms.sun_direction.w * max(dot(n, to_sun), 0.0);

    let to_point = uniforms.point_position.xyz - in.world_position;
    let range = uniforms.point_position.w;
    let dist = length(to_point);
    var falloff = 0.0;
    if (range > 0.0) {
        falloff = clamp(1.0 - dist / range, 0.0, 1.0);
    }
    let lambert = max(dot(n, to_point / max(dist, 1e-4)), 0.0);
    light += uniforms.point_color.rgb * uniforms.point_color.w * lambert * falloff;

    var color = albedo.rgb * light * uniforms.params.x;
    if (uniforms.params.y > 0.5) {
        color = aces(color);
    }
    return vec4<f32>(color, albedo.a);
}
"#;

/// Unlit instanced spheres for targets and projectiles.
const SPHERE_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
};

struct InstanceInput {
    @location(1) center_radius: vec4<f32>,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_sphere(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let world = instance.center_radius.xyz + vertex.position * instance.center_radius.w;
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(world, 1.0);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_sphere(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

pub fn model_shader() -> String {
    format!("{UNIFORMS}{MODEL_BODY}")
}

pub fn sphere_shader() -> String {
    format!("{UNIFORMS}{SPHERE_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_share_uniform_block() {
        for src in [model_shader(), sphere_shader()] {
            assert!(src.contains("var<uniform> uniforms: Uniforms"));
            assert_eq!(src.matches("struct Uniforms").count(), 1);
        }
        assert!(model_shader().contains("fn fs_model"));
        assert!(model_shader().contains("textureSample(base_texture, base_sampler, in.uv)"));
        assert!(!sphere_shader().contains("base_texture"));
        assert!(sphere_shader().contains("fn vs_sphere"));
    }
}
