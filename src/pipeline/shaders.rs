//! WGSL sources for the scene shaders

use crate::resources::ShaderKind;

/// Uniforms and bindings shared by every scene shader
pub const SCENE_PRELUDE: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    sky_view_proj: mat4x4<f32>,
    position: vec4<f32>,
}

struct LightingUniform {
    light_position: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
    attenuation: vec4<f32>,
    flags: vec4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
}

struct MaterialUniform {
    environment_rotation: mat4x4<f32>,
    params: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> lighting: LightingUniform;
@group(1) @binding(0) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var<uniform> material: MaterialUniform;
@group(2) @binding(1) var diffuse_texture: texture_2d<f32>;
@group(2) @binding(2) var diffuse2_texture: texture_2d<f32>;
@group(2) @binding(3) var specular_texture: texture_2d<f32>;
@group(2) @binding(4) var reflectivity_texture: texture_2d<f32>;
@group(2) @binding(5) var environment_texture: texture_cube<f32>;
@group(2) @binding(6) var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) tangent: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}
"#;

const MESH_VERTEX: &str = r#"
@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;

    let world_pos = object.model * vec4<f32>(in.position, 1.0);
    out.world_position = world_pos.xyz;
    out.clip_position = camera.view_proj * world_pos;
    out.world_normal = normalize((object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;

    return out;
}
"#;

const LIGHTING_FUNCTIONS: &str = r#"
// Blinn-Phong with point light falloff. The lighting flags select what
// reaches the output: x = unlit, y = ambient only, z = specular only.
fn shade(world_position: vec3<f32>, world_normal: vec3<f32>, base: vec3<f32>, specular_mask: f32) -> vec3<f32> {
    if (lighting.flags.x > 0.5) {
        return base;
    }

    let n = normalize(world_normal);
    let to_light = lighting.light_position.xyz - world_position;
    let distance = length(to_light);
    let l = to_light / max(distance, 0.0001);
    let v = normalize(camera.position.xyz - world_position);
    let h = normalize(l + v);

    let falloff = 1.0 / (lighting.attenuation.x
        + lighting.attenuation.y * distance
        + lighting.attenuation.z * distance * distance);

    let ambient = lighting.ambient.rgb * lighting.ambient.w
        + lighting.light_color.rgb * lighting.light_color.w;
    let diffuse = max(dot(n, l), 0.0) * lighting.light_color.rgb;
    let specular = pow(max(dot(n, h), 0.0), material.params.x)
        * lighting.attenuation.w * specular_mask * lighting.light_color.rgb;

    if (lighting.flags.y > 0.5) {
        return ambient * base;
    }
    if (lighting.flags.z > 0.5) {
        return specular * falloff;
    }
    return (ambient + diffuse * falloff) * base + specular * falloff;
}

fn environment_sample(world_position: vec3<f32>, world_normal: vec3<f32>) -> vec3<f32> {
    let v = normalize(world_position - camera.position.xyz);
    let r = reflect(v, normalize(world_normal));
    let dir = (material.environment_rotation * vec4<f32>(r, 0.0)).xyz;
    return textureSample(environment_texture, material_sampler, dir).rgb;
}

fn base_color(uv: vec2<f32>) -> vec4<f32> {
    let first = textureSample(diffuse_texture, material_sampler, uv);
    let second = textureSample(diffuse2_texture, material_sampler, uv);
    return mix(first, second, material.params.y);
}
"#;

const BLINN_PHONG_TEXTURED: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = base_color(in.uv);
    let specular_mask = textureSample(specular_texture, material_sampler, in.uv).r;
    let color = shade(in.world_position, in.world_normal, base.rgb, specular_mask);
    return vec4<f32>(color, base.a);
}
"#;

const BLINN_PHONG_REFLECTIVE: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = base_color(in.uv);
    let specular_mask = textureSample(specular_texture, material_sampler, in.uv).r;
    let reflectivity = textureSample(reflectivity_texture, material_sampler, in.uv).r;
    let environment = environment_sample(in.world_position, in.world_normal);
    let lit = shade(in.world_position, in.world_normal, base.rgb, specular_mask);
    return vec4<f32>(mix(lit, environment, reflectivity), base.a);
}
"#;

const REFLECTIVE: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(environment_sample(in.world_position, in.world_normal), 1.0);
}
"#;

// Drawn at the far plane around the eye; world_position carries the
// sampling direction.
const SKYBOX: &str = r#"
@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;

    let clip = camera.sky_view_proj * vec4<f32>(in.position, 1.0);
    out.clip_position = clip.xyww;
    out.world_position = (material.environment_rotation * vec4<f32>(in.position, 0.0)).xyz;
    out.world_normal = in.normal;
    out.uv = in.uv;

    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(textureSample(environment_texture, material_sampler, in.world_position).rgb, 1.0);
}
"#;

/// Complete WGSL module for a shader kind
pub fn scene_shader_source(kind: ShaderKind) -> String {
    match kind {
        ShaderKind::BlinnPhongTextured => {
            format!("{SCENE_PRELUDE}{MESH_VERTEX}{LIGHTING_FUNCTIONS}{BLINN_PHONG_TEXTURED}")
        }
        ShaderKind::BlinnPhongReflective => {
            format!("{SCENE_PRELUDE}{MESH_VERTEX}{LIGHTING_FUNCTIONS}{BLINN_PHONG_REFLECTIVE}")
        }
        ShaderKind::Reflective => {
            format!("{SCENE_PRELUDE}{MESH_VERTEX}{LIGHTING_FUNCTIONS}{REFLECTIVE}")
        }
        ShaderKind::Skybox => format!("{SCENE_PRELUDE}{SKYBOX}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_both_entry_points() {
        for kind in ShaderKind::ALL {
            let source = scene_shader_source(kind);
            assert_eq!(source.matches("fn vs_main").count(), 1, "{:?}", kind);
            assert_eq!(source.matches("fn fs_main").count(), 1, "{:?}", kind);
        }
    }

    #[test]
    fn skybox_writes_far_depth() {
        assert!(scene_shader_source(ShaderKind::Skybox).contains("clip.xyww"));
    }
}
