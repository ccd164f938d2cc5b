//! Greyscale post-processing effect

use glam::Vec4;
use std::any::Any;

use super::{EffectCore, EffectParameter, PostEffect};
use crate::backend::GraphicsBackend;

const GREYSCALE_SHADER: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let source = textureSample(source_texture, source_sampler, in.uv);
    let luminance = dot(source.rgb, vec3<f32>(0.2989, 0.587, 0.114));
    return vec4<f32>(mix(source.rgb, vec3<f32>(luminance), effect.params.x), source.a);
}
"#;

/// Luminance-weighted greyscale blended in by `intensity`
pub struct GreyscaleEffect {
    core: EffectCore,
    intensity: f32,
}

impl GreyscaleEffect {
    pub fn new() -> Self {
        Self {
            core: EffectCore::new("Greyscale", GREYSCALE_SHADER),
            intensity: 1.0,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }
}

impl Default for GreyscaleEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GraphicsBackend> PostEffect<B> for GreyscaleEffect {
    fn core(&self) -> &EffectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    fn uniform_params(&self) -> Vec4 {
        Vec4::new(self.intensity, 0.0, 0.0, 0.0)
    }

    fn parameter(&self) -> Option<EffectParameter> {
        Some(EffectParameter::unit("Intensity", self.intensity))
    }

    fn set_parameter(&mut self, value: f32) {
        self.set_intensity(value);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
