//! 3D LUT colour grading

use glam::{Vec3, Vec4};
use std::any::Any;

use super::{EffectCore, EffectParameter, PostEffect};
use crate::backend::*;
use crate::resources::{GpuTexture, Lut3d};

const COLOUR_CORRECTION_SHADER: &str = r#"
@group(0) @binding(3) var lut_texture: texture_3d<f32>;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let source = textureSample(source_texture, source_sampler, in.uv);
    let unit = clamp(source.rgb * effect.volume_scale.xyz + effect.volume_offset.xyz, vec3<f32>(0.0), vec3<f32>(1.0));
    let coord = unit * effect.params.z + effect.params.w;
    let graded = textureSampleLevel(lut_texture, source_sampler, coord, 0.0).rgb;
    return vec4<f32>(mix(source.rgb, graded, effect.params.x), source.a);
}
"#;

pub struct ColourCorrectionEffect {
    core: EffectCore,
    intensity: f32,
    lut: Lut3d,
    lut_texture: Option<GpuTexture>,
}

impl ColourCorrectionEffect {
    pub fn new(lut: Lut3d) -> Self {
        Self {
            core: EffectCore::new("Colour Correction", COLOUR_CORRECTION_SHADER),
            intensity: 1.0,
            lut,
            lut_texture: None,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    pub fn lut(&self) -> &Lut3d {
        &self.lut
    }

    /// Scale and offset that map 0..1 onto texel centres of the LUT
    pub fn lut_coordinate_transform(&self) -> (f32, f32) {
        let size = self.lut.size.max(1) as f32;
        ((size - 1.0) / size, 0.5 / size)
    }
}

impl<B: GraphicsBackend> PostEffect<B> for ColourCorrectionEffect {
    fn core(&self) -> &EffectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    fn init(&mut self, backend: &mut B, width: u32, height: u32) -> BackendResult<()> {
        if self.lut_texture.is_none() {
            self.lut_texture = Some(self.lut.upload(backend)?);
        }
        let volume = self.lut_texture.as_ref().map(|t| t.view);
        self.core.init(backend, width, height, volume)
    }

    fn uniform_params(&self) -> Vec4 {
        let (scale, offset) = self.lut_coordinate_transform();
        Vec4::new(self.intensity, 0.0, scale, offset)
    }

    fn volume_transform(&self) -> (Vec3, Vec3) {
        self.lut.domain_transform()
    }

    fn parameter(&self) -> Option<EffectParameter> {
        Some(EffectParameter::unit("Intensity", self.intensity))
    }

    fn set_parameter(&mut self, value: f32) {
        self.set_intensity(value);
    }

    fn release(&mut self, backend: &mut B) {
        self.core.release(backend);
        if let Some(texture) = self.lut_texture.take() {
            backend.destroy_texture_view(texture.view);
            backend.destroy_texture(texture.handle);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lut_coordinates_hit_texel_centres() {
        let effect = ColourCorrectionEffect::new(Lut3d::identity(32));
        let (scale, offset) = effect.lut_coordinate_transform();
        // 0 lands on the first texel centre, 1 on the last
        assert!((offset - 0.5 / 32.0).abs() < 1e-6);
        assert!((scale + offset - 31.5 / 32.0).abs() < 1e-6);
    }

    #[test]
    fn lookup_follows_the_input_domain() {
        let mut lut = Lut3d::identity(2);
        lut.domain_max = Vec3::splat(2.0);
        let effect = ColourCorrectionEffect::new(lut);
        let (scale, offset) =
            <ColourCorrectionEffect as PostEffect<crate::WgpuBackend>>::volume_transform(&effect);
        let unit = Vec3::splat(1.0) * scale + offset;
        assert!((unit - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn intensity_is_clamped() {
        let mut effect = ColourCorrectionEffect::new(Lut3d::identity(2));
        effect.set_intensity(3.0);
        assert_eq!(effect.intensity(), 1.0);
        effect.set_intensity(-1.0);
        assert_eq!(effect.intensity(), 0.0);
    }
}
