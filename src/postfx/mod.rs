//! Post-processing effects
//!
//! The scene is drawn into a [`Framebuffer`]; the active [`PostEffect`] reads
//! it, writes its own framebuffer, and finally copies that to the screen.

mod bloom;
mod chain;
mod colour_correction;
mod framebuffer;
mod fullscreen;
mod greyscale;
mod sepia;

pub use bloom::BloomEffect;
pub use chain::EffectChain;
pub use colour_correction::ColourCorrectionEffect;
pub use framebuffer::*;
pub use fullscreen::*;
pub use greyscale::GreyscaleEffect;
pub use sepia::SepiaEffect;

use glam::{Vec3, Vec4};
use std::any::Any;

use crate::backend::*;

/// The one tunable value an effect exposes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParameter {
    pub label: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl EffectParameter {
    pub fn unit(label: &'static str, value: f32) -> Self {
        Self {
            label,
            value,
            min: 0.0,
            max: 1.0,
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Framebuffer plus the two fullscreen passes every effect needs
pub struct EffectCore {
    name: &'static str,
    fragment_shader: &'static str,
    framebuffer: Framebuffer,
    pass: Option<FullscreenPass>,
    screen: Option<FullscreenPass>,
}

impl EffectCore {
    pub fn new(name: &'static str, fragment_shader: &'static str) -> Self {
        Self {
            name,
            fragment_shader,
            framebuffer: Framebuffer::new(name, false),
            pass: None,
            screen: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Create the framebuffer, and the pipelines on first use
    pub fn init<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
        volume: Option<TextureViewHandle>,
    ) -> BackendResult<()> {
        self.framebuffer.init(backend, width, height)?;

        if self.pass.is_none() {
            self.pass = Some(FullscreenPass::new(
                backend,
                self.name,
                self.fragment_shader,
                FRAMEBUFFER_COLOR_FORMAT,
                volume,
            )?);
        }
        if self.screen.is_none() {
            let format = backend.swapchain_format();
            self.screen = Some(FullscreenPass::new(
                backend,
                &format!("{} To Screen", self.name),
                BLIT_FRAGMENT_SHADER,
                format,
                None,
            )?);
        }
        Ok(())
    }

    pub fn resize<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        self.framebuffer.resize(backend, width, height)
    }

    pub fn clear<B: GraphicsBackend>(&self, backend: &mut B) {
        self.framebuffer.clear(backend, [0.0, 0.0, 0.0, 1.0]);
    }

    /// Run the effect pass from `previous` into this framebuffer
    pub fn apply<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        previous: &Framebuffer,
        params: Vec4,
        volume_transform: (Vec3, Vec3),
    ) -> BackendResult<()> {
        let name = self.name;
        let not_ready = || BackendError::NotInitialized(name.to_string());
        let source = previous
            .color_view()
            .ok_or_else(|| BackendError::NotInitialized(previous.label().to_string()))?;
        let target = self.framebuffer.color_view().ok_or_else(not_ready)?;
        let (width, height) = previous.size();
        let pass = self.pass.as_mut().ok_or_else(not_ready)?;

        let (scale, offset) = volume_transform;
        let uniform = EffectUniform::new(params, width, height).with_volume_transform(scale, offset);
        pass.write_uniform(backend, &uniform);
        pass.draw(backend, source, target)
    }

    pub fn draw_to_screen<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        target: TextureViewHandle,
    ) -> BackendResult<()> {
        let name = self.name;
        let not_ready = || BackendError::NotInitialized(name.to_string());
        let source = self.framebuffer.color_view().ok_or_else(not_ready)?;
        let screen = self.screen.as_mut().ok_or_else(not_ready)?;
        screen.draw(backend, source, target)
    }

    pub fn release<B: GraphicsBackend>(&mut self, backend: &mut B) {
        self.framebuffer.release(backend);
        if let Some(mut pass) = self.pass.take() {
            pass.release(backend);
        }
        if let Some(mut screen) = self.screen.take() {
            screen.release(backend);
        }
    }
}

/// A single-pass image effect with its own framebuffer.
///
/// `init` must run before `apply`. `apply` reads the colour target of the
/// previous framebuffer and overwrites this effect's own.
pub trait PostEffect<B: GraphicsBackend>: 'static {
    fn core(&self) -> &EffectCore;

    fn core_mut(&mut self) -> &mut EffectCore;

    /// Values packed into the effect uniform's `params`
    fn uniform_params(&self) -> Vec4;

    /// Scale and offset taking a colour into volume texture coordinates
    fn volume_transform(&self) -> (Vec3, Vec3) {
        (Vec3::ONE, Vec3::ZERO)
    }

    fn parameter(&self) -> Option<EffectParameter>;

    fn set_parameter(&mut self, value: f32);

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn name(&self) -> &'static str {
        self.core().name()
    }

    fn init(&mut self, backend: &mut B, width: u32, height: u32) -> BackendResult<()> {
        self.core_mut().init(backend, width, height, None)
    }

    fn resize(&mut self, backend: &mut B, width: u32, height: u32) -> BackendResult<()> {
        self.core_mut().resize(backend, width, height)
    }

    fn clear(&mut self, backend: &mut B) {
        self.core().clear(backend);
    }

    fn apply(&mut self, backend: &mut B, previous: &Framebuffer) -> BackendResult<()> {
        let params = self.uniform_params();
        let volume = self.volume_transform();
        self.core_mut().apply(backend, previous, params, volume)
    }

    fn draw_to_screen(&mut self, backend: &mut B, target: TextureViewHandle) -> BackendResult<()> {
        self.core_mut().draw_to_screen(backend, target)
    }

    fn framebuffer(&self) -> &Framebuffer {
        self.core().framebuffer()
    }

    fn release(&mut self, backend: &mut B) {
        self.core_mut().release(backend);
    }
}
