//! Sepia post-processing effect

use glam::Vec4;
use std::any::Any;

use super::{EffectCore, EffectParameter, PostEffect};
use crate::backend::GraphicsBackend;

const SEPIA_SHADER: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let source = textureSample(source_texture, source_sampler, in.uv);
    let sepia = vec3<f32>(
        dot(source.rgb, vec3<f32>(0.393, 0.769, 0.189)),
        dot(source.rgb, vec3<f32>(0.349, 0.686, 0.168)),
        dot(source.rgb, vec3<f32>(0.272, 0.534, 0.131)),
    );
    return vec4<f32>(mix(source.rgb, min(sepia, vec3<f32>(1.0)), effect.params.x), source.a);
}
"#;

pub struct SepiaEffect {
    core: EffectCore,
    intensity: f32,
}

impl SepiaEffect {
    pub fn new() -> Self {
        Self {
            core: EffectCore::new("Sepia", SEPIA_SHADER),
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

impl Default for SepiaEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GraphicsBackend> PostEffect<B> for SepiaEffect {
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
