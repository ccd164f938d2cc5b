//! Bloom post-processing effect

use glam::Vec4;
use std::any::Any;

use super::{EffectCore, EffectParameter, PostEffect};
use crate::backend::GraphicsBackend;

/// Bright pass and a 5x5 gaussian in one pass, added back onto the source.
/// With `params.y` at zero the source passes through untouched.
const BLOOM_SHADER: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let source = textureSampleLevel(source_texture, source_sampler, in.uv, 0.0);
    if (effect.params.y < 0.5) {
        return source;
    }

    let threshold = effect.params.x;
    var weights = array<f32, 5>(0.0625, 0.25, 0.375, 0.25, 0.0625);
    var glow = vec3<f32>(0.0);

    for (var y = 0; y < 5; y++) {
        for (var x = 0; x < 5; x++) {
            let offset = vec2<f32>(f32(x - 2), f32(y - 2)) * effect.texel.xy * 2.0;
            let tap = textureSampleLevel(source_texture, source_sampler, in.uv + offset, 0.0).rgb;
            let brightness = dot(tap, vec3<f32>(0.2126, 0.7152, 0.0722));
            let bright = select(vec3<f32>(0.0), tap, brightness > threshold);
            glow += bright * weights[x] * weights[y];
        }
    }

    return vec4<f32>(source.rgb + glow, source.a);
}
"#;

pub struct BloomEffect {
    core: EffectCore,
    threshold: f32,
    apply_bloom: bool,
}

impl BloomEffect {
    pub const DEFAULT_THRESHOLD: f32 = 0.25;

    pub fn new() -> Self {
        Self {
            core: EffectCore::new("Bloom", BLOOM_SHADER),
            threshold: Self::DEFAULT_THRESHOLD,
            apply_bloom: false,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn apply_bloom(&self) -> bool {
        self.apply_bloom
    }

    /// When off the effect passes the image through unchanged
    pub fn set_apply_bloom(&mut self, apply: bool) {
        self.apply_bloom = apply;
    }
}

impl Default for BloomEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GraphicsBackend> PostEffect<B> for BloomEffect {
    fn core(&self) -> &EffectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    fn uniform_params(&self) -> Vec4 {
        let apply = if self.apply_bloom { 1.0 } else { 0.0 };
        Vec4::new(self.threshold, apply, 0.0, 0.0)
    }

    fn parameter(&self) -> Option<EffectParameter> {
        Some(EffectParameter::unit("Threshold", self.threshold))
    }

    fn set_parameter(&mut self, value: f32) {
        self.set_threshold(value);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::wgpu_backend::WgpuBackend;

    #[test]
    fn bloom_starts_disabled_at_default_threshold() {
        let bloom = BloomEffect::new();
        assert!(!bloom.apply_bloom());
        assert!((bloom.threshold() - 0.25).abs() < 1e-6);
        let params = <BloomEffect as PostEffect<WgpuBackend>>::uniform_params(&bloom);
        assert_eq!(params.y, 0.0);
    }

    #[test]
    fn apply_flag_reaches_uniform() {
        let mut bloom = BloomEffect::new();
        bloom.set_apply_bloom(true);
        let params = <BloomEffect as PostEffect<WgpuBackend>>::uniform_params(&bloom);
        assert_eq!(params.y, 1.0);
        assert!((params.x - 0.25).abs() < 1e-6);
    }
}
