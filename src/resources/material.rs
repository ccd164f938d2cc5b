//! Shader materials for the Blinn-Phong scene renderer

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Which scene shader a material is drawn with.
///
/// The declaration order is also the draw order within a render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderKind {
    BlinnPhongTextured,
    BlinnPhongReflective,
    Reflective,
    Skybox,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 4] = [
        ShaderKind::BlinnPhongTextured,
        ShaderKind::BlinnPhongReflective,
        ShaderKind::Reflective,
        ShaderKind::Skybox,
    ];
}

/// Identifier of a material registered with the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub u32);

/// Identifier of a texture registered with the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Shader choice plus the textures and constants it samples.
///
/// Texture slots left empty are bound to a 1x1 white texture (or a flat
/// cube map for the environment).
#[derive(Debug, Clone)]
pub struct ShaderMaterial {
    pub name: String,
    pub shader: ShaderKind,
    pub diffuse: Option<TextureId>,
    pub diffuse2: Option<TextureId>,
    pub specular: Option<TextureId>,
    pub reflectivity: Option<TextureId>,
    pub environment: Option<TextureId>,
    pub shininess: f32,
    /// Blend factor between `diffuse` (0) and `diffuse2` (1)
    pub texture_mix: f32,
    pub environment_rotation: Mat4,
    /// Materials in higher layers draw later
    pub render_layer: i32,
}

impl ShaderMaterial {
    pub fn new(name: &str, shader: ShaderKind) -> Self {
        Self {
            name: name.to_string(),
            shader,
            diffuse: None,
            diffuse2: None,
            specular: None,
            reflectivity: None,
            environment: None,
            shininess: 8.0,
            texture_mix: 0.0,
            environment_rotation: Mat4::from_rotation_x(90f32.to_radians()),
            render_layer: 0,
        }
    }

    pub fn with_diffuse(mut self, texture: TextureId) -> Self {
        self.diffuse = Some(texture);
        self
    }

    pub fn with_diffuse2(mut self, texture: TextureId) -> Self {
        self.diffuse2 = Some(texture);
        self
    }

    pub fn with_specular(mut self, texture: TextureId) -> Self {
        self.specular = Some(texture);
        self
    }

    pub fn with_reflectivity(mut self, texture: TextureId) -> Self {
        self.reflectivity = Some(texture);
        self
    }

    pub fn with_environment(mut self, texture: TextureId) -> Self {
        self.environment = Some(texture);
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn with_texture_mix(mut self, mix: f32) -> Self {
        self.texture_mix = mix.clamp(0.0, 1.0);
        self
    }

    pub fn with_environment_rotation(mut self, rotation: Mat4) -> Self {
        self.environment_rotation = rotation;
        self
    }

    pub fn with_render_layer(mut self, layer: i32) -> Self {
        self.render_layer = layer;
        self
    }

    pub fn uniform_data(&self) -> MaterialUniformData {
        MaterialUniformData {
            environment_rotation: self.environment_rotation,
            params: Vec4::new(self.shininess, self.texture_mix, 0.0, 0.0),
        }
    }
}

/// Material uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniformData {
    pub environment_rotation: Mat4,
    pub params: Vec4, // x=shininess, y=texture mix
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn defaults_match_scene_materials() {
        let mat = ShaderMaterial::new("lego", ShaderKind::BlinnPhongTextured);
        assert!((mat.shininess - 8.0).abs() < 1e-6);
        assert_eq!(mat.texture_mix, 0.0);
        assert_eq!(mat.render_layer, 0);
    }

    #[test]
    fn environment_rotation_turns_y_into_z() {
        let mat = ShaderMaterial::new("sky", ShaderKind::Skybox);
        let v = mat.environment_rotation.transform_vector3(Vec3::Y);
        assert!((v - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn texture_mix_is_clamped() {
        let mat = ShaderMaterial::new("m", ShaderKind::BlinnPhongReflective).with_texture_mix(1.5);
        assert_eq!(mat.texture_mix, 1.0);
        assert_eq!(mat.uniform_data().params.y, 1.0);
    }

    #[test]
    fn shader_kinds_order_for_sorting() {
        assert!(ShaderKind::BlinnPhongTextured < ShaderKind::Skybox);
        assert_eq!(std::mem::size_of::<MaterialUniformData>(), 80);
    }
}
