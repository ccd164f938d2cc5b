//! The ordered set of selectable post effects

use super::{
    BloomEffect, ColourCorrectionEffect, EffectParameter, Framebuffer, GreyscaleEffect,
    PostEffect, SepiaEffect,
};
use crate::backend::*;
use crate::resources::Lut3d;

/// Greyscale, sepia, bloom and colour correction, in that order; one of them
/// is active at a time
pub struct EffectChain<B: GraphicsBackend> {
    effects: Vec<Box<dyn PostEffect<B>>>,
    active: usize,
}

impl<B: GraphicsBackend + 'static> EffectChain<B> {
    /// Bloom
    pub const DEFAULT_ACTIVE: usize = 2;

    pub fn new(lut: Lut3d) -> Self {
        let effects: Vec<Box<dyn PostEffect<B>>> = vec![
            Box::new(GreyscaleEffect::new()),
            Box::new(SepiaEffect::new()),
            Box::new(BloomEffect::new()),
            Box::new(ColourCorrectionEffect::new(lut)),
        ];
        Self {
            effects,
            active: Self::DEFAULT_ACTIVE,
        }
    }

    pub fn init(&mut self, backend: &mut B, width: u32, height: u32) -> BackendResult<()> {
        for effect in &mut self.effects {
            effect.init(backend, width, height)?;
        }
        Ok(())
    }

    pub fn resize(&mut self, backend: &mut B, width: u32, height: u32) -> BackendResult<()> {
        for effect in &mut self.effects {
            effect.resize(backend, width, height)?;
        }
        Ok(())
    }

    pub fn clear_all(&mut self, backend: &mut B) {
        for effect in &mut self.effects {
            effect.clear(backend);
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &dyn PostEffect<B> {
        self.effects[self.active].as_ref()
    }

    pub fn active_mut(&mut self) -> &mut dyn PostEffect<B> {
        self.effects[self.active].as_mut()
    }

    /// Select the effect at `index`. Out of range indices are rejected and
    /// leave the selection unchanged.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.effects.len() {
            log::warn!(
                "Ignoring effect index {} ({} effects available)",
                index,
                self.effects.len()
            );
            return false;
        }
        if index != self.active {
            log::info!("Active effect: {}", self.effects[index].name());
        }
        self.active = index;
        true
    }

    /// Select an effect by name, ignoring ASCII case
    pub fn set_active_by_name(&mut self, name: &str) -> bool {
        match self
            .effects
            .iter()
            .position(|e| e.name().eq_ignore_ascii_case(name))
        {
            Some(index) => self.set_active(index),
            None => {
                log::warn!("Unknown effect '{}'", name);
                false
            }
        }
    }

    pub fn active_parameter(&self) -> Option<EffectParameter> {
        self.active().parameter()
    }

    pub fn set_active_parameter(&mut self, value: f32) {
        self.active_mut().set_parameter(value);
    }

    /// First effect of type `T`
    pub fn get_mut<T: PostEffect<B>>(&mut self) -> Option<&mut T> {
        self.effects
            .iter_mut()
            .find_map(|e| e.as_any_mut().downcast_mut::<T>())
    }

    pub fn set_apply_bloom(&mut self, apply: bool) {
        if let Some(bloom) = self.get_mut::<BloomEffect>() {
            bloom.set_apply_bloom(apply);
        }
    }

    pub fn apply_active(&mut self, backend: &mut B, scene: &Framebuffer) -> BackendResult<()> {
        self.active_mut().apply(backend, scene)
    }

    pub fn draw_active_to_screen(
        &mut self,
        backend: &mut B,
        target: TextureViewHandle,
    ) -> BackendResult<()> {
        self.active_mut().draw_to_screen(backend, target)
    }

    pub fn release(&mut self, backend: &mut B) {
        for effect in &mut self.effects {
            effect.release(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::wgpu_backend::WgpuBackend;

    fn chain() -> EffectChain<WgpuBackend> {
        EffectChain::new(Lut3d::identity(2))
    }

    #[test]
    fn effects_are_ordered_with_bloom_active() {
        let chain = chain();
        assert_eq!(
            chain.names(),
            vec!["Greyscale", "Sepia", "Bloom", "Colour Correction"]
        );
        assert_eq!(chain.active_index(), 2);
        assert_eq!(chain.active().name(), "Bloom");
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let mut chain = chain();
        assert!(chain.set_active(0));
        assert!(!chain.set_active(4));
        assert_eq!(chain.active_index(), 0);
        assert!(chain.set_active(3));
        assert_eq!(chain.active().name(), "Colour Correction");
    }

    #[test]
    fn selection_by_name() {
        let mut chain = chain();
        assert!(chain.set_active_by_name("sepia"));
        assert_eq!(chain.active_index(), 1);
        assert!(!chain.set_active_by_name("vignette"));
        assert_eq!(chain.active_index(), 1);
    }

    #[test]
    fn parameters_are_clamped() {
        let mut chain = chain();
        chain.set_active_parameter(1.5);
        assert_eq!(chain.active_parameter().unwrap().value, 1.0);
        chain.set_active_parameter(-0.5);
        assert_eq!(chain.active_parameter().unwrap().value, 0.0);

        chain.set_active(0);
        chain.set_active_parameter(0.4);
        let p = chain.active_parameter().unwrap();
        assert_eq!(p.label, "Intensity");
        assert!((p.value - 0.4).abs() < 1e-6);
    }

    #[test]
    fn bloom_flag_reaches_bloom_effect() {
        let mut chain = chain();
        chain.set_apply_bloom(true);
        assert!(chain.get_mut::<BloomEffect>().unwrap().apply_bloom());
        chain.set_apply_bloom(false);
        assert!(!chain.get_mut::<BloomEffect>().unwrap().apply_bloom());
    }
}
